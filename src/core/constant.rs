use serde::{Deserialize, Serialize};

use crate::core::NodeValue;
use crate::core::signal::Signal;
use crate::core::task::{RunContext, Task, TaskLogic};

/// A source task that always yields the same value. Literal call arguments
/// are wrapped in one of these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    value: NodeValue,
}

impl Constant {
    pub fn new(value: NodeValue) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// A constant task that is not added to the thread's current flow.
    pub(crate) fn detached_task(value: NodeValue) -> Task {
        Task::builder(Constant::new(value)).detached().build()
    }
}

impl TaskLogic for Constant {
    fn run(&self, _ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        Ok(self.value.clone())
    }

    fn state(&self) -> Option<NodeValue> {
        serde_json::to_value(self).ok()
    }

    fn restore(&mut self, state: &NodeValue) -> Result<(), serde_json::Error> {
        *self = Constant::deserialize(state)?;
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "Constant"
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}

impl Task {
    /// The wrapped value, if this is a constant task.
    pub fn constant_value(&self) -> Option<&NodeValue> {
        self.logic::<Constant>().map(Constant::value)
    }
}
