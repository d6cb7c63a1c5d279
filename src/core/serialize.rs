//! Externalizing task configuration.
//!
//! A task serializes to a flat record of its configuration plus its id,
//! type tag and the crate version that built it. Types with settings of
//! their own (a parameter's default, a constant's value) add them under
//! `state`. Deserializing rebuilds a task of the recorded type and makes the
//! recorded id authoritative. Graph edges are not part of the record.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::NodeValue;
use crate::core::constant::Constant;
use crate::core::error::SerializationError;
use crate::core::parameter::Parameter;
use crate::core::task::{Task, TaskBuilder, TaskLogic};
use crate::core::trigger::Trigger;

/// The external representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedTask {
    pub name: String,
    pub id: String,
    pub description: Option<String>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Option<Duration>,
    /// Name of the trigger
    pub trigger: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub version: String,
    /// Settings specific to the task's type; omitted when it has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeValue>,
}

/// Builds a fresh logic instance for a task type.
pub type LogicFactory = fn() -> Box<dyn TaskLogic>;

fn task_types() -> MutexGuard<'static, HashMap<String, LogicFactory>> {
    static TASK_TYPES: OnceLock<Mutex<HashMap<String, LogicFactory>>> = OnceLock::new();
    TASK_TYPES
        .get_or_init(|| {
            let mut types: HashMap<String, LogicFactory> = HashMap::new();
            types.insert("Parameter".to_string(), || -> Box<dyn TaskLogic> {
                Box::new(Parameter::default())
            });
            types.insert("Constant".to_string(), || -> Box<dyn TaskLogic> {
                Box::new(Constant::default())
            });
            Mutex::new(types)
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Makes `type_name` resolvable during deserialization.
pub fn register_task_type(type_name: impl Into<String>, factory: LogicFactory) {
    let type_name = type_name.into();
    if task_types().insert(type_name.clone(), factory).is_some() {
        log::warn!("Task type '{}' was already registered, overwriting.", type_name);
    }
}

/// Registers `L` under its own type name, built from `L::default()`.
pub fn register_task_type_of<L: TaskLogic + Default>() {
    register_task_type(L::default().type_name(), || -> Box<dyn TaskLogic> {
        Box::new(L::default())
    });
}

impl Task {
    pub fn serialize(&self) -> SerializedTask {
        let config = self.config();
        SerializedTask {
            name: config.name.clone(),
            id: self.id(),
            description: config.description.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            timeout: config.timeout,
            trigger: config.trigger.name().to_string(),
            task_type: self.type_name().to_string(),
            version: self.version().to_string(),
            state: self.logic_state(),
        }
    }

    /// The serialized record as a JSON object.
    pub fn to_json(&self) -> Result<NodeValue, SerializationError> {
        Ok(serde_json::to_value(self.serialize())?)
    }

    /// Rebuilds a task from its record and registers it under the recorded
    /// id. The task is not added to the thread's current flow.
    pub fn deserialize(serialized: &SerializedTask) -> Result<Task, SerializationError> {
        let factory = task_types()
            .get(&serialized.task_type)
            .copied()
            .ok_or_else(|| SerializationError::UnknownType(serialized.task_type.clone()))?;
        let trigger = Trigger::from_name(&serialized.trigger)
            .ok_or_else(|| SerializationError::UnknownTrigger(serialized.trigger.clone()))?;

        let mut logic = factory();
        if let Some(state) = &serialized.state {
            logic
                .restore(state)
                .map_err(|source| SerializationError::InvalidState {
                    task_type: serialized.task_type.clone(),
                    source,
                })?;
        }

        let task = TaskBuilder::from_boxed(logic)
            .name(serialized.name.clone())
            .optional_description(serialized.description.clone())
            .max_retries(serialized.max_retries)
            .retry_delay(serialized.retry_delay)
            .optional_timeout(serialized.timeout)
            .trigger(trigger)
            .version(serialized.version.clone())
            .detached()
            .build();

        task.set_id(serialized.id.clone());
        Ok(task)
    }

    pub fn from_json(value: NodeValue) -> Result<Task, SerializationError> {
        let serialized: SerializedTask = serde_json::from_value(value)?;
        Task::deserialize(&serialized)
    }
}
