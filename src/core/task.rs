use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::core::context;
use crate::core::identity::{self, generate_id};
use crate::core::signal::Signal;
use crate::core::signature::Signature;
use crate::core::trigger::{self, Trigger};
use crate::core::{AsAny, NodeValue};

/// Retry delay used when none is configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retries allowed when none are configured.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Everything a work function sees when it runs.
pub struct RunContext<'a> {
    /// Name of the task being run
    pub task_name: &'a str,
    /// Upstream results keyed by edge label
    pub inputs: &'a HashMap<String, NodeValue>,
    /// Runtime parameters supplied for the whole flow run
    pub parameters: &'a HashMap<String, NodeValue>,
}

/// Defines the work a task performs and the inputs it declares.
pub trait TaskLogic: AsAny + Send + Sync + 'static {
    /// The declared inputs of the work function. Defaults to none.
    fn signature(&self) -> Signature {
        Signature::new()
    }

    /// Perform the work.
    ///
    /// Return `Err(Signal::Fail(..))` for expected, policy-relevant failures
    /// and `Err(Signal::Error(..))` for anything unexpected.
    fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal>;

    /// Settings specific to this logic type that serialization must carry,
    /// such as a parameter's default. `None` when the task's configuration
    /// is enough to rebuild it.
    fn state(&self) -> Option<NodeValue> {
        None
    }

    /// Applies a value produced by [`TaskLogic::state`] to a freshly built
    /// instance of the same type.
    fn restore(&mut self, _state: &NodeValue) -> Result<(), serde_json::Error> {
        Ok(())
    }

    /// Tag used as the default task name and as the serialized `type`.
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Create a boxed clone of this trait object.
    fn clone_box(&self) -> Box<dyn TaskLogic>;
}

impl Clone for Box<dyn TaskLogic> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The configuration of a task. Interpreted by the execution engine, only
/// stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    pub max_retries: u32,
    /// Only meaningful when `max_retries > 0`
    pub retry_delay: Duration,
    /// `None` means unbounded
    pub timeout: Option<Duration>,
    pub trigger: Trigger,
    /// Shared between a task and its copies
    pub secrets: Arc<BTreeMap<String, String>>,
}

pub(crate) struct TaskData {
    id: RwLock<String>,
    config: TaskConfig,
    logic: Box<dyn TaskLogic>,
    version: String,
}

/// A configured, identified unit of work.
///
/// `Task` is a shared handle: cloning it yields another handle to the same
/// task (same id, same registry entry). Use [`Task::copy`] for a new task.
/// Equality and hashing follow handle identity, not the id.
#[derive(Clone)]
pub struct Task(Arc<TaskData>);

impl Task {
    /// Builds a task with default configuration.
    pub fn new<L: TaskLogic>(logic: L) -> Task {
        Task::builder(logic).build()
    }

    pub fn builder<L: TaskLogic>(logic: L) -> TaskBuilder {
        TaskBuilder::from_boxed(Box::new(logic))
    }

    pub(crate) fn from_data(data: Arc<TaskData>) -> Task {
        Task(data)
    }

    pub(crate) fn data(&self) -> &Arc<TaskData> {
        &self.0
    }

    // Identification ---------------------------------------------------------

    pub fn id(&self) -> String {
        self.0
            .id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The first 8 characters of the id.
    pub fn short_id(&self) -> String {
        self.id().chars().take(8).collect()
    }

    /// Replaces the id and registers the task under it. The entry for the
    /// previous id is left to expire on its own.
    pub fn set_id(&self, id: impl Into<String>) {
        {
            let mut slot = self.0.id.write().unwrap_or_else(PoisonError::into_inner);
            *slot = id.into();
        }
        self.register();
    }

    pub fn register(&self) {
        identity::register(self);
    }

    /// A new task with the same configuration and logic under a fresh id.
    ///
    /// The copy shares the secrets map with the original.
    pub fn copy(&self) -> Task {
        let task = Task(Arc::new(TaskData {
            id: RwLock::new(generate_id()),
            config: self.0.config.clone(),
            logic: self.0.logic.clone_box(),
            version: self.0.version.clone(),
        }));
        task.register();
        task
    }

    // Configuration ----------------------------------------------------------

    pub fn config(&self) -> &TaskConfig {
        &self.0.config
    }

    pub fn name(&self) -> &str {
        &self.0.config.name
    }

    pub fn description(&self) -> Option<&str> {
        self.0.config.description.as_deref()
    }

    pub fn max_retries(&self) -> u32 {
        self.0.config.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.0.config.retry_delay
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.0.config.timeout
    }

    pub fn trigger(&self) -> Trigger {
        self.0.config.trigger
    }

    pub fn secrets(&self) -> &Arc<BTreeMap<String, String>> {
        &self.0.config.secrets
    }

    /// Version of this crate at the time the task was built.
    pub fn version(&self) -> &str {
        &self.0.version
    }

    pub fn type_name(&self) -> &'static str {
        self.0.logic.type_name()
    }

    /// Type-specific settings of the task's logic, see [`TaskLogic::state`].
    pub fn logic_state(&self) -> Option<NodeValue> {
        self.0.logic.state()
    }

    /// Downcasts the task's logic to its concrete type.
    pub fn logic<L: TaskLogic>(&self) -> Option<&L> {
        let logic: &dyn TaskLogic = &*self.0.logic;
        logic.as_any().downcast_ref::<L>()
    }

    // Run --------------------------------------------------------------------

    /// Names of the declared inputs, in declaration order.
    pub fn inputs(&self) -> Vec<String> {
        self.0.logic.signature().names()
    }

    pub fn signature(&self) -> Signature {
        self.0.logic.signature()
    }

    /// Runs the work function against the parameters of the current thread.
    pub fn run(&self, inputs: &HashMap<String, NodeValue>) -> Result<NodeValue, Signal> {
        let parameters = context::parameters();
        self.run_with(inputs, &parameters)
    }

    pub fn run_with(
        &self,
        inputs: &HashMap<String, NodeValue>,
        parameters: &HashMap<String, NodeValue>,
    ) -> Result<NodeValue, Signal> {
        let name = self.name();
        let ctx = RunContext {
            task_name: name,
            inputs,
            parameters,
        };
        self.0.logic.run(&ctx)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Task {}

impl std::hash::Hash for Task {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Task: \"{}\" type={} id={}>",
            self.name(),
            self.type_name(),
            self.short_id()
        )
    }
}

/// Builder for [`Task`].
pub struct TaskBuilder {
    logic: Box<dyn TaskLogic>,
    name: Option<String>,
    description: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
    timeout: Option<Duration>,
    trigger: Trigger,
    secrets: BTreeMap<String, String>,
    version: Option<String>,
    attach: bool,
}

impl TaskBuilder {
    pub(crate) fn from_boxed(logic: Box<dyn TaskLogic>) -> Self {
        Self {
            logic,
            name: None,
            description: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: None,
            trigger: trigger::ALL_SUCCESSFUL,
            secrets: BTreeMap::new(),
            version: None,
            attach: true,
        }
    }

    /// Defaults to the logic's type name. An empty name is ignored.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn secrets(mut self, secrets: BTreeMap<String, String>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn secret(mut self, name: impl Into<String>, reference: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), reference.into());
        self
    }

    pub(crate) fn optional_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub(crate) fn optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Keeps the task out of the thread's current flow.
    pub(crate) fn detached(mut self) -> Self {
        self.attach = false;
        self
    }

    /// Assigns an id, registers the task and adds it to the current flow,
    /// if one is being built on this thread.
    pub fn build(self) -> Task {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.logic.type_name().to_string());

        let task = Task(Arc::new(TaskData {
            id: RwLock::new(generate_id()),
            config: TaskConfig {
                name,
                description: self.description,
                max_retries: self.max_retries,
                retry_delay: self.retry_delay,
                timeout: self.timeout,
                trigger: self.trigger,
                secrets: Arc::new(self.secrets),
            },
            logic: self.logic,
            version: self.version.unwrap_or_else(|| crate::VERSION.to_string()),
        }));
        task.register();

        if self.attach {
            if let Some(flow) = context::current_flow() {
                flow.add_task(&task);
            }
        }
        task
    }
}
