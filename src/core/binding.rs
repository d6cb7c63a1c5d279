//! Turning a task call into graph edges.
//!
//! Calling a task binds the supplied arguments to the parameters its logic
//! declares, then records the task and one labelled edge per bound argument
//! in a flow. The call hands back a [`Called`] handle that names both the
//! task and that flow, and can itself be passed on as an argument:
//!
//! ```rust
//! use taskwright::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Clone)]
//! struct Add;
//!
//! impl TaskLogic for Add {
//!     fn signature(&self) -> Signature {
//!         Signature::new().param("x").param("y")
//!     }
//!
//!     fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
//!         let x = ctx.inputs["x"].as_i64().unwrap_or(0);
//!         let y = ctx.inputs["y"].as_i64().unwrap_or(0);
//!         Ok(json!(x + y))
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn TaskLogic> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let flow = Flow::new("sum");
//! let first = Task::new(Add);
//! let second = Task::new(Add);
//!
//! let partial = first.call_in(&flow, CallArgs::new().arg(1).arg(2)).unwrap();
//! second.call_in(&flow, CallArgs::new().arg(partial).kwarg("y", 10)).unwrap();
//!
//! assert_eq!(flow.edges_to(&second).len(), 2);
//!
//! // Outside any flow, a call reuses the flow of the calls feeding it.
//! let step = Task::new(Add).call(CallArgs::new().arg(3).arg(4)).unwrap();
//! let total = Task::new(Add).call(CallArgs::new().arg(&step).arg(5)).unwrap();
//! assert_eq!(total.flow(), step.flow());
//! assert_eq!(total.flow().upstream_tasks(&total)[0], *step.task());
//! ```

use std::ops::Deref;

use crate::core::NodeValue;
use crate::core::constant::Constant;
use crate::core::context;
use crate::core::error::{BindingError, BindingErrorKind};
use crate::core::flow::Flow;
use crate::core::signature::Signature;
use crate::core::task::Task;

/// What a task call returns: the called task and the flow its edges went to.
///
/// Dereferences to the task, and can be passed straight into another call.
#[derive(Debug, Clone, PartialEq)]
pub struct Called {
    task: Task,
    flow: Flow,
}

impl Called {
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// The flow the call recorded into. For a call made outside any flow this
    /// is the only handle on it.
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn into_task(self) -> Task {
        self.task
    }
}

impl Deref for Called {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

/// An argument to a task call: an upstream task or a literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Task(Task),
    /// The result of an earlier call, along with the flow it was recorded in
    Called(Called),
    Value(NodeValue),
}

impl Input {
    /// The upstream task, wrapping a literal in a new constant task.
    pub fn into_task(self) -> Task {
        match self {
            Input::Task(task) => task,
            Input::Called(called) => called.task,
            Input::Value(value) => Constant::detached_task(value),
        }
    }
}

impl From<Task> for Input {
    fn from(task: Task) -> Self {
        Input::Task(task)
    }
}

impl From<&Task> for Input {
    fn from(task: &Task) -> Self {
        Input::Task(task.clone())
    }
}

impl From<Called> for Input {
    fn from(called: Called) -> Self {
        Input::Called(called)
    }
}

impl From<&Called> for Input {
    fn from(called: &Called) -> Self {
        Input::Called(called.clone())
    }
}

impl From<NodeValue> for Input {
    fn from(value: NodeValue) -> Self {
        Input::Value(value)
    }
}

macro_rules! input_from_literal {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Input {
                fn from(value: $t) -> Self {
                    Input::Value(NodeValue::from(value))
                }
            }
        )*
    };
}

input_from_literal!(bool, i32, i64, u32, u64, f64, &str, String);

/// Positional and keyword arguments of a task call, in call order.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Input>,
    keyword: Vec<(String, Input)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Input>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Input>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }
}

/// Binds `args` to `signature`.
///
/// Returns one `(parameter, input)` pair per bound argument: declared
/// parameters first in declaration order, then keywords absorbed by the
/// capture in call order, each under its own name. Optional parameters left
/// unbound are omitted.
pub fn bind(
    task_name: &str,
    signature: &Signature,
    args: CallArgs,
) -> Result<Vec<(String, Input)>, BindingError> {
    let error = |kind| BindingError::new(task_name, kind);
    signature
        .validate()
        .map_err(|e| error(BindingErrorKind::InvalidSignature(e)))?;
    let params = &signature.params;

    if args.positional.len() > params.len() {
        return Err(error(BindingErrorKind::TooManyPositional {
            expected: params.len(),
            given: args.positional.len(),
        }));
    }

    let mut slots: Vec<Option<Input>> = vec![None; params.len()];
    for (slot, value) in slots.iter_mut().zip(args.positional) {
        *slot = Some(value);
    }

    let mut captured: Vec<(String, Input)> = Vec::new();
    for (name, value) in args.keyword {
        if let Some(index) = signature.position(&name) {
            if slots[index].is_some() {
                return Err(error(BindingErrorKind::MultipleValues(name)));
            }
            slots[index] = Some(value);
        } else if signature.var_keyword.is_some() {
            if captured.iter().any(|(n, _)| *n == name) {
                return Err(error(BindingErrorKind::MultipleValues(name)));
            }
            captured.push((name, value));
        } else {
            return Err(error(BindingErrorKind::UnexpectedKeyword(name)));
        }
    }

    let mut bound = Vec::with_capacity(slots.len() + captured.len());
    for (param, slot) in params.iter().zip(slots) {
        match slot {
            Some(value) => bound.push((param.name.clone(), value)),
            None if param.required => {
                return Err(error(BindingErrorKind::MissingArgument(param.name.clone())));
            }
            None => {}
        }
    }
    bound.extend(captured);
    Ok(bound)
}

/// The flow for a call made while no flow is current: the flow of the first
/// upstream call, with the flows of any other upstream calls merged in, or a
/// new flow when no argument comes from an earlier call.
fn implicit_flow(task: &Task, bindings: &[(String, Input)]) -> Flow {
    let mut upstream_flows = bindings.iter().filter_map(|(_, input)| match input {
        Input::Called(called) => Some(called.flow()),
        _ => None,
    });

    match upstream_flows.next() {
        Some(flow) => {
            for other in upstream_flows {
                flow.merge(other);
            }
            flow.clone()
        }
        None => {
            log::warn!(
                "Task \"{}\" called outside of a flow; recording it in a new, unnamed flow.",
                task.name()
            );
            Flow::new("")
        }
    }
}

impl Task {
    /// Calls the task: binds `args` and records the task and its upstream
    /// edges in the thread's current flow.
    ///
    /// Without a current flow the call records into the flow of the calls
    /// that feed it, or into a new flow. Either way the returned [`Called`]
    /// names the flow used.
    pub fn call(&self, args: CallArgs) -> Result<Called, BindingError> {
        let bindings = bind(self.name(), &self.signature(), args)?;
        let (flow, _guard) = match context::current_flow() {
            Some(flow) => (flow, None),
            None => {
                let flow = implicit_flow(self, &bindings);
                let guard = flow.enter();
                (flow, Some(guard))
            }
        };

        let task = flow.set_dependencies(self, Vec::new(), bindings);
        Ok(Called { task, flow })
    }

    /// Like [`Task::call`], but records into `flow` regardless of the
    /// thread's current flow.
    pub fn call_in(&self, flow: &Flow, args: CallArgs) -> Result<Called, BindingError> {
        let bindings = bind(self.name(), &self.signature(), args)?;
        let task = flow.set_dependencies(self, Vec::new(), bindings);
        Ok(Called {
            task,
            flow: flow.clone(),
        })
    }
}
