use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::core::signal::State;

/// Predicate deciding whether a task may run given its upstream states.
pub type TriggerFn = fn(&[State]) -> bool;

/// A named trigger predicate.
///
/// Tasks only store and serialize triggers; the execution engine evaluates
/// them. Two triggers are equal when their names are equal, since the name
/// is what survives serialization.
#[derive(Clone, Copy)]
pub struct Trigger {
    name: &'static str,
    predicate: TriggerFn,
}

impl Trigger {
    /// Creates a trigger. Call [`register_trigger`] as well if tasks using it
    /// are going to be deserialized.
    pub const fn custom(name: &'static str, predicate: TriggerFn) -> Self {
        Self { name, predicate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn evaluate(&self, upstream: &[State]) -> bool {
        (self.predicate)(upstream)
    }

    /// Resolves a trigger by name: built-ins first, then registered ones.
    pub fn from_name(name: &str) -> Option<Trigger> {
        if let Some(t) = BUILTIN.iter().find(|t| t.name == name) {
            return Some(*t);
        }
        custom_triggers()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }
}

impl Default for Trigger {
    fn default() -> Self {
        ALL_SUCCESSFUL
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Trigger {}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Trigger").field(&self.name).finish()
    }
}

fn all_successful(upstream: &[State]) -> bool {
    upstream.iter().all(|s| s.is_successful())
}

fn all_failed(upstream: &[State]) -> bool {
    upstream.iter().all(|s| s.is_failed())
}

fn all_finished(upstream: &[State]) -> bool {
    upstream.iter().all(|s| s.is_finished())
}

// The `any_*` predicates are vacuously true without upstream tasks.
fn any_successful(upstream: &[State]) -> bool {
    upstream.is_empty() || upstream.iter().any(|s| s.is_successful())
}

fn any_failed(upstream: &[State]) -> bool {
    upstream.is_empty() || upstream.iter().any(|s| s.is_failed())
}

fn manual_only(_upstream: &[State]) -> bool {
    false
}

pub const ALL_SUCCESSFUL: Trigger = Trigger::custom("all_successful", all_successful);
pub const ALL_FAILED: Trigger = Trigger::custom("all_failed", all_failed);
pub const ALL_FINISHED: Trigger = Trigger::custom("all_finished", all_finished);
pub const ANY_SUCCESSFUL: Trigger = Trigger::custom("any_successful", any_successful);
pub const ANY_FAILED: Trigger = Trigger::custom("any_failed", any_failed);
/// Never fires on its own; the task has to be started by hand.
pub const MANUAL_ONLY: Trigger = Trigger::custom("manual_only", manual_only);

const BUILTIN: [Trigger; 6] = [
    ALL_SUCCESSFUL,
    ALL_FAILED,
    ALL_FINISHED,
    ANY_SUCCESSFUL,
    ANY_FAILED,
    MANUAL_ONLY,
];

fn custom_triggers() -> &'static Mutex<HashMap<&'static str, Trigger>> {
    static TRIGGERS: OnceLock<Mutex<HashMap<&'static str, Trigger>>> = OnceLock::new();
    TRIGGERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Makes a custom trigger resolvable by name during deserialization.
pub fn register_trigger(trigger: Trigger) {
    if BUILTIN.contains(&trigger) {
        log::warn!(
            "Trigger '{}' shadows a built-in trigger and will never be resolved.",
            trigger.name
        );
    }
    custom_triggers()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(trigger.name, trigger);
}
