use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::binding::Input;
use crate::core::context::{self, FlowGuard};
use crate::core::task::Task;

/// A directed dependency from `upstream` to `downstream`, labelled with the
/// parameter of `downstream` it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub upstream: Task,
    pub downstream: Task,
    pub key: Option<String>,
}

#[derive(Default)]
struct FlowGraph {
    name: String,
    tasks: Vec<Task>,
    edges: Vec<Edge>,
}

/// An in-memory workflow graph of tasks and labelled edges.
///
/// `Flow` is a shared handle; clones refer to the same graph. It only stores
/// the graph, scheduling and execution are someone else's job.
#[derive(Clone)]
pub struct Flow(Arc<Mutex<FlowGraph>>);

impl Flow {
    pub fn new(name: impl Into<String>) -> Flow {
        let name = name.into();
        log::debug!("Creating flow \"{}\"", name);
        Flow(Arc::new(Mutex::new(FlowGraph {
            name,
            ..FlowGraph::default()
        })))
    }

    fn graph(&self) -> MutexGuard<'_, FlowGraph> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> String {
        self.graph().name.clone()
    }

    /// Makes this the current flow of the thread until the guard is dropped.
    /// Tasks built meanwhile are added to it.
    pub fn enter(&self) -> FlowGuard {
        context::enter_flow(self.clone())
    }

    /// Runs `f` with this flow as the current one.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Adds a task as a node. Returns `false` if it was already present.
    pub fn add_task(&self, task: &Task) -> bool {
        let mut graph = self.graph();
        if graph.tasks.contains(task) {
            return false;
        }
        log::debug!("Adding {:?} to flow \"{}\"", task, graph.name);
        graph.tasks.push(task.clone());
        true
    }

    /// Adds an edge, adding either endpoint as a node if needed. Parallel
    /// edges are kept.
    pub fn add_edge(&self, upstream: &Task, downstream: &Task, key: Option<&str>) -> Edge {
        self.add_task(upstream);
        self.add_task(downstream);

        let edge = Edge {
            upstream: upstream.clone(),
            downstream: downstream.clone(),
            key: key.map(str::to_string),
        };
        let mut graph = self.graph();
        log::debug!(
            "Adding edge {:?} -> {:?} ({}) to flow \"{}\"",
            upstream,
            downstream,
            key.unwrap_or("-"),
            graph.name
        );
        graph.edges.push(edge.clone());
        edge
    }

    /// Registers `task` and one edge per dependency. Literal values are
    /// wrapped in constant tasks first.
    pub fn set_dependencies(
        &self,
        task: &Task,
        upstream_tasks: Vec<Input>,
        keyword_tasks: Vec<(String, Input)>,
    ) -> Task {
        self.add_task(task);

        for upstream in upstream_tasks {
            self.add_edge(&upstream.into_task(), task, None);
        }
        for (key, upstream) in keyword_tasks {
            self.add_edge(&upstream.into_task(), task, Some(&key));
        }
        task.clone()
    }

    /// Copies the tasks and edges of `other` into this flow. Tasks already
    /// present and edges already recorded are not added twice.
    pub fn merge(&self, other: &Flow) {
        if self == other {
            return;
        }
        let (tasks, edges) = {
            let graph = other.graph();
            (graph.tasks.clone(), graph.edges.clone())
        };

        for task in &tasks {
            self.add_task(task);
        }
        let mut graph = self.graph();
        log::debug!(
            "Merging {} edge(s) into flow \"{}\"",
            edges.len(),
            graph.name
        );
        for edge in edges {
            if !graph.edges.contains(&edge) {
                graph.edges.push(edge);
            }
        }
    }

    pub fn contains(&self, task: &Task) -> bool {
        self.graph().tasks.contains(task)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        self.graph().tasks.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.graph().edges.clone()
    }

    pub fn edges_to(&self, task: &Task) -> Vec<Edge> {
        self.graph()
            .edges
            .iter()
            .filter(|e| &e.downstream == task)
            .cloned()
            .collect()
    }

    pub fn edges_from(&self, task: &Task) -> Vec<Edge> {
        self.graph()
            .edges
            .iter()
            .filter(|e| &e.upstream == task)
            .cloned()
            .collect()
    }

    pub fn upstream_tasks(&self, task: &Task) -> Vec<Task> {
        let mut upstream: Vec<Task> = Vec::new();
        for edge in self.edges_to(task) {
            if !upstream.contains(&edge.upstream) {
                upstream.push(edge.upstream);
            }
        }
        upstream
    }

    pub fn downstream_tasks(&self, task: &Task) -> Vec<Task> {
        let mut downstream: Vec<Task> = Vec::new();
        for edge in self.edges_from(task) {
            if !downstream.contains(&edge.downstream) {
                downstream.push(edge.downstream);
            }
        }
        downstream
    }

    /// Tasks with no incoming edges.
    pub fn root_tasks(&self) -> Vec<Task> {
        let graph = self.graph();
        graph
            .tasks
            .iter()
            .filter(|t| !graph.edges.iter().any(|e| &e.downstream == *t))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph().tasks.is_empty()
    }
}

impl PartialEq for Flow {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Flow {}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let graph = self.graph();
        f.debug_struct("Flow")
            .field("name", &graph.name)
            .field("tasks", &graph.tasks.len())
            .field("edges", &graph.edges.len())
            .finish()
    }
}
