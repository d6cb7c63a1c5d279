pub mod binding;
pub mod constant;
pub mod context;
pub mod error;
pub mod flow;
pub mod identity;
pub mod parameter;
pub mod serialize;
pub mod signal;
pub mod signature;
pub mod task;
pub mod trigger;

use std::any::Any;

/// The Alias for serde_json::Value, used for literal inputs, parameters and results
pub type NodeValue = serde_json::Value;

/// A helper trait that just provides the `as_any` method.
/// Needed for downcasting a task's `TaskLogic` back to its concrete type
/// (e.g. reading a `Parameter`'s settings or a `Constant`'s value).
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
