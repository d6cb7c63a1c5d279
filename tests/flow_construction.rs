//! Integration tests for wiring tasks into flows by calling them.

use serde_json::json;
use std::collections::HashMap;
use taskwright::prelude::*;
use taskwright::{BindingErrorKind, identity};

#[derive(Clone)]
struct AddLogic;

impl TaskLogic for AddLogic {
    fn signature(&self) -> Signature {
        "x, y, c?".parse().unwrap()
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        let get = |k: &str| ctx.inputs.get(k).and_then(|v| v.as_i64()).unwrap_or(0);
        Ok(json!(get("x") + get("y") + get("c")))
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

#[derive(Clone)]
struct MergeLogic;

impl TaskLogic for MergeLogic {
    fn signature(&self) -> Signature {
        Signature::new().param("base").var_keyword("extra")
    }

    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        Ok(json!(ctx.inputs))
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

#[derive(Clone)]
struct PingLogic;

impl TaskLogic for PingLogic {
    fn run(&self, _ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        Ok(json!("pong"))
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

fn edge_summary(flow: &Flow, task: &Task) -> Vec<(String, NodeValue)> {
    flow.edges_to(task)
        .into_iter()
        .map(|e| {
            let source = e.upstream.constant_value().cloned().unwrap_or(NodeValue::Null);
            (e.key.unwrap_or_default(), source)
        })
        .collect()
}

#[test]
fn test_call_records_labelled_edges() {
    let flow = Flow::new("add");
    let add = Task::new(AddLogic);

    let _guard = flow.enter();
    add.call(CallArgs::new().arg(5).arg(7).kwarg("c", 1)).unwrap();

    assert_eq!(flow.tasks().iter().filter(|t| **t == add).count(), 1);
    assert_eq!(
        edge_summary(&flow, &add),
        vec![
            ("x".to_string(), json!(5)),
            ("y".to_string(), json!(7)),
            ("c".to_string(), json!(1)),
        ]
    );
}

#[test]
fn test_binding_errors() {
    let flow = Flow::new("errors");
    let add = Task::builder(AddLogic).name("adder").build();

    let err = add
        .call_in(&flow, CallArgs::new().arg(5).arg(7).kwarg("z", 9))
        .unwrap_err();
    assert_eq!(err.kind, BindingErrorKind::UnexpectedKeyword("z".into()));
    assert_eq!(err.task, "adder");

    let err = add.call_in(&flow, CallArgs::new().arg(5)).unwrap_err();
    assert_eq!(err.kind, BindingErrorKind::MissingArgument("y".into()));

    // A failed call leaves the flow untouched.
    assert!(flow.is_empty());
    assert!(flow.edges().is_empty());
}

#[test]
fn test_chaining_results_into_calls() {
    let flow = Flow::new("chain");
    let (first, second) = flow.scope(|| {
        let first = Task::new(AddLogic).call(CallArgs::new().arg(1).arg(2)).unwrap();
        let second = Task::new(AddLogic)
            .call(CallArgs::new().arg(&first).arg(&first))
            .unwrap();
        (first, second)
    });

    assert_eq!(second.flow(), &flow);
    let edges = flow.edges_to(&second);
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.upstream == *first));
    assert_eq!(flow.upstream_tasks(&second), vec![first.task().clone()]);
    assert_eq!(flow.downstream_tasks(&first), vec![second.into_task()]);
}

#[test]
fn test_keyword_capture_edges() {
    let flow = Flow::new("merge");
    let merge = Task::new(MergeLogic);
    merge
        .call_in(
            &flow,
            CallArgs::new().arg("base").kwarg("left", 1).kwarg("right", 2),
        )
        .unwrap();

    let keys: Vec<String> = flow
        .edges_to(&merge)
        .into_iter()
        .filter_map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["base", "left", "right"]);
    assert_eq!(merge.inputs(), vec!["base", "extra"]);
}

#[test]
fn test_dependency_free_call_still_registers_node() {
    let flow = Flow::new("ping");
    let ping = Task::new(PingLogic);
    ping.call_in(&flow, CallArgs::new()).unwrap();

    assert!(flow.contains(&ping));
    assert!(flow.edges().is_empty());
    assert!(ping.inputs().is_empty());
}

#[test]
fn test_call_without_flow_returns_its_flow() {
    let add = Task::new(AddLogic);
    let called = add.call(CallArgs::new().arg(1).arg(2)).unwrap();

    assert_eq!(*called, add);
    assert!(taskwright::context::current_flow().is_none());
    assert!(called.flow().contains(&add));
    assert_eq!(
        edge_summary(called.flow(), &add),
        vec![("x".to_string(), json!(1)), ("y".to_string(), json!(2))]
    );
}

#[test]
fn test_chained_calls_without_flow_share_one_graph() {
    let a = Task::builder(AddLogic).name("a").build();
    let b = Task::builder(AddLogic).name("b").build();

    let ra = a.call(CallArgs::new().arg(1).arg(2)).unwrap();
    let rb = b.call(CallArgs::new().arg(&ra).arg(&ra)).unwrap();

    assert_eq!(rb.flow(), ra.flow());
    let flow = rb.flow();
    let keys: Vec<String> = flow
        .edges_to(&b)
        .into_iter()
        .filter(|e| e.upstream == a)
        .filter_map(|e| e.key)
        .collect();
    assert_eq!(keys, vec!["x", "y"]);
    assert_eq!(flow.edges_to(&a).len(), 2);
    // a, b and the two constants feeding a
    assert_eq!(flow.len(), 4);
}

#[test]
fn test_separate_upstream_flows_are_merged() {
    let left = Task::new(AddLogic).call(CallArgs::new().arg(1).arg(2)).unwrap();
    let right = Task::new(AddLogic).call(CallArgs::new().arg(3).arg(4)).unwrap();
    assert_ne!(left.flow(), right.flow());

    let total = Task::new(AddLogic)
        .call(CallArgs::new().arg(&left).arg(&right))
        .unwrap();

    let flow = total.flow();
    assert_eq!(flow, left.flow());
    assert!(flow.contains(&right));
    assert_eq!(flow.edges_to(&right).len(), 2);
    assert_eq!(flow.upstream_tasks(&total), vec![left.into_task(), right.into_task()]);
    assert_eq!(flow.edges().len(), 6);
}

#[test]
fn test_concurrent_flows_are_isolated() {
    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            std::thread::spawn(move || {
                let flow = Flow::new(format!("flow-{}", i));
                let _guard = flow.enter();
                for _ in 0..10 {
                    Task::new(AddLogic)
                        .call(CallArgs::new().arg(i).arg(i))
                        .unwrap();
                }
                flow
            })
        })
        .collect();

    for handle in handles {
        let flow = handle.join().unwrap();
        // 10 adders plus two constants each
        assert_eq!(flow.len(), 30);
        assert_eq!(flow.edges().len(), 20);
    }
}

#[test]
fn test_id_reassignment_and_registry() {
    let task = Task::new(PingLogic);
    let id = identity::generate_id();
    task.set_id(id.clone());

    assert_eq!(identity::lookup(&id), Some(task.clone()));
    assert_eq!(task.short_id(), id[..8]);
}

#[test]
fn test_copy_is_independent_task() {
    let task = Task::builder(AddLogic)
        .name("adder")
        .max_retries(2)
        .secret("API_KEY", "env:API_KEY")
        .build();
    let copy = task.copy();

    assert_ne!(copy.id(), task.id());
    assert_eq!(identity::lookup(&copy.id()), Some(copy.clone()));
    assert_eq!(copy.config(), task.config());
    assert_eq!(copy.inputs(), task.inputs());
}

#[test]
fn test_parameter_feeds_downstream() {
    let flow = Flow::new("params");
    let add = flow.scope(|| {
        let x = Parameter::task("x", None, true);
        let y = Parameter::task("y", Some(json!(10)), false);
        Task::new(AddLogic)
            .call(CallArgs::new().arg(x).arg(y))
            .unwrap()
    });

    let parameters = HashMap::from([("x".to_string(), json!(4))]);
    let mut inputs = HashMap::new();
    for edge in flow.edges_to(&add) {
        let value = edge.upstream.run_with(&HashMap::new(), &parameters).unwrap();
        inputs.insert(edge.key.unwrap_or_default(), value);
    }
    assert_eq!(add.run(&inputs), Ok(json!(14)));
}

#[test]
fn test_missing_required_parameter_fails() {
    let n = Parameter::task("n", None, true);
    let result = taskwright::context::with_parameters(HashMap::new(), || n.run(&HashMap::new()));

    let signal = result.unwrap_err();
    assert!(signal.is_controlled());
    assert!(matches!(&signal, Signal::Fail(msg) if msg.contains("n")));
}
