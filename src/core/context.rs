//! Ambient construction and run context, scoped to the current thread.
//!
//! Each thread keeps its own stack of flows under construction and its own
//! stack of runtime parameters, so flows built concurrently on different
//! threads never see each other's tasks. Entries are pushed by guards. A
//! dropped guard truncates the stack back to the depth it found, so guards
//! dropped out of order never remove an entry pushed before them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;

use crate::core::NodeValue;
use crate::core::flow::Flow;

thread_local! {
    static FLOWS: RefCell<Vec<Flow>> = const { RefCell::new(Vec::new()) };
    static PARAMETERS: RefCell<Vec<HashMap<String, NodeValue>>> = const { RefCell::new(Vec::new()) };
}

/// The flow currently being built on this thread, if any.
pub fn current_flow() -> Option<Flow> {
    FLOWS.with(|flows| flows.borrow().last().cloned())
}

/// Keeps a flow current until dropped. Not `Send`: it must be dropped on the
/// thread that created it.
#[must_use = "the flow stops being current as soon as the guard is dropped"]
pub struct FlowGuard {
    depth: usize,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        FLOWS.with(|flows| flows.borrow_mut().truncate(self.depth));
    }
}

pub(crate) fn enter_flow(flow: Flow) -> FlowGuard {
    let depth = FLOWS.with(|flows| {
        let mut flows = flows.borrow_mut();
        flows.push(flow);
        flows.len() - 1
    });
    FlowGuard {
        depth,
        _thread_bound: PhantomData,
    }
}

/// Runtime parameters visible to tasks run on this thread. Empty if none were
/// supplied.
pub fn parameters() -> HashMap<String, NodeValue> {
    PARAMETERS.with(|params| params.borrow().last().cloned().unwrap_or_default())
}

#[must_use = "the parameters are withdrawn as soon as the guard is dropped"]
pub struct ParametersGuard {
    depth: usize,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for ParametersGuard {
    fn drop(&mut self) {
        PARAMETERS.with(|params| params.borrow_mut().truncate(self.depth));
    }
}

/// Makes `parameters` the runtime parameters of this thread until the guard
/// is dropped.
pub fn enter_parameters(parameters: HashMap<String, NodeValue>) -> ParametersGuard {
    let depth = PARAMETERS.with(|params| {
        let mut params = params.borrow_mut();
        params.push(parameters);
        params.len() - 1
    });
    ParametersGuard {
        depth,
        _thread_bound: PhantomData,
    }
}

/// Runs `f` with `parameters` as this thread's runtime parameters.
pub fn with_parameters<R>(parameters: HashMap<String, NodeValue>, f: impl FnOnce() -> R) -> R {
    let _guard = enter_parameters(parameters);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_flow_by_default() {
        assert!(current_flow().is_none());
    }

    #[test]
    fn test_flow_guards_nest() {
        let outer = Flow::new("outer");
        let inner = Flow::new("inner");

        let _outer_guard = outer.enter();
        assert_eq!(current_flow(), Some(outer.clone()));
        {
            let _inner_guard = inner.enter();
            assert_eq!(current_flow(), Some(inner.clone()));
        }
        assert_eq!(current_flow(), Some(outer));
    }

    #[test]
    fn test_guards_dropped_out_of_order() {
        struct Scopes {
            _outer: FlowGuard,
            _inner: FlowGuard,
        }

        let base = Flow::new("base");
        let _base_guard = base.enter();

        let inner = Flow::new("inner");
        let outer_guard = Flow::new("outer").enter();
        let inner_guard = inner.enter();

        // Fields drop in declaration order: the outer guard goes first.
        drop(Scopes {
            _outer: outer_guard,
            _inner: inner_guard,
        });
        assert_eq!(current_flow(), Some(base.clone()));

        let outer = Flow::new("outer");
        let outer_guard = outer.enter();
        let inner_guard = inner.enter();
        drop(outer_guard);
        assert_eq!(current_flow(), Some(base.clone()));
        drop(inner_guard);
        assert_eq!(current_flow(), Some(base));
    }

    #[test]
    fn test_parameter_guards_dropped_out_of_order() {
        let first = enter_parameters(HashMap::from([("n".to_string(), json!(1))]));
        let second = enter_parameters(HashMap::from([("n".to_string(), json!(2))]));
        drop(first);
        assert!(parameters().is_empty());
        drop(second);
        assert!(parameters().is_empty());
    }

    #[test]
    fn test_parameters_scoped() {
        assert!(parameters().is_empty());
        let seen = with_parameters(HashMap::from([("n".to_string(), json!(1))]), parameters);
        assert_eq!(seen.get("n"), Some(&json!(1)));
        assert!(parameters().is_empty());
    }

    #[test]
    fn test_flows_do_not_cross_threads() {
        let flow = Flow::new("main");
        let _guard = flow.enter();

        let other = std::thread::spawn(current_flow).join().unwrap();
        assert!(other.is_none());
        assert_eq!(current_flow(), Some(flow));
    }
}
