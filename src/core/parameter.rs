use serde::{Deserialize, Serialize};

use crate::core::NodeValue;
use crate::core::signal::Signal;
use crate::core::task::{RunContext, Task, TaskLogic};

/// A task that reads a value supplied for the flow run, looked up by the
/// task's name in the runtime parameters.
///
/// A parameter with a default is never required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    required: bool,
    #[serde(default)]
    default: Option<NodeValue>,
}

impl Parameter {
    pub fn new(default: Option<NodeValue>, required: bool) -> Self {
        Self {
            required: required && default.is_none(),
            default,
        }
    }

    /// Builds a parameter task named `name`.
    pub fn task(name: impl Into<String>, default: Option<NodeValue>, required: bool) -> Task {
        Task::builder(Parameter::new(default, required))
            .name(name)
            .build()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&NodeValue> {
        self.default.as_ref()
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Parameter::new(None, true)
    }
}

impl TaskLogic for Parameter {
    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
        match ctx.parameters.get(ctx.task_name) {
            Some(value) => Ok(value.clone()),
            None if self.required => Err(Signal::fail(format!(
                "Parameter \"{}\" was required but not provided.",
                ctx.task_name
            ))),
            None => Ok(self.default.clone().unwrap_or(NodeValue::Null)),
        }
    }

    fn state(&self) -> Option<NodeValue> {
        serde_json::to_value(self).ok()
    }

    fn restore(&mut self, state: &NodeValue) -> Result<(), serde_json::Error> {
        let restored = Parameter::deserialize(state)?;
        *self = Parameter::new(restored.default, restored.required);
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "Parameter"
    }

    fn clone_box(&self) -> Box<dyn TaskLogic> {
        Box::new(self.clone())
    }
}
