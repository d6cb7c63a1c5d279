//! Task identifiers and the process-wide task registry.
//!
//! The registry maps identifiers to live tasks without keeping them alive: it
//! only stores weak pointers. Entries for dropped tasks linger until the map
//! has doubled in size since the last sweep, and looking one up in the
//! meantime yields `None`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::core::task::{Task, TaskData};

/// Size below which dead entries are never swept.
const MIN_SWEEP_SIZE: usize = 64;

struct Registry {
    entries: HashMap<String, Weak<TaskData>>,
    sweep_at: usize,
}

impl Registry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP_SIZE,
        }
    }

    /// Inserts an entry, sweeping dead ones first once the map has grown to
    /// twice its live size. Returns the live task previously under `id`.
    fn insert(&mut self, id: String, task: Weak<TaskData>) -> Option<Arc<TaskData>> {
        if self.entries.len() >= self.sweep_at {
            self.entries.retain(|_, weak| weak.strong_count() > 0);
            self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_SIZE);
        }
        self.entries.insert(id, task).and_then(|old| old.upgrade())
    }

    fn get(&self, id: &str) -> Option<Arc<TaskData>> {
        self.entries.get(id).and_then(Weak::upgrade)
    }
}

fn registry() -> MutexGuard<'static, Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(Registry::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Produces a new universally unique task identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Inserts or overwrites the registry entry for the task's current id.
pub fn register(task: &Task) {
    let id = task.id();
    log::debug!("Registering task \"{}\" as {}", task.name(), id);

    let previous = registry().insert(id.clone(), Arc::downgrade(task.data()));
    if let Some(previous) = previous {
        if !Arc::ptr_eq(&previous, task.data()) {
            log::warn!(
                "Task id {} was registered to another live task; it now points to \"{}\".",
                id,
                task.name()
            );
        }
    }
}

/// Finds the live task currently registered under `id`.
pub fn lookup(id: &str) -> Option<Task> {
    registry().get(id).map(Task::from_data)
}

/// Number of registry entries whose task is still alive.
pub fn live_count() -> usize {
    registry()
        .entries
        .values()
        .filter(|weak| weak.strong_count() > 0)
        .count()
}
