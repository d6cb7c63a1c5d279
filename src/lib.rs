//! # Taskwright
//!
//! Declare units of work as tasks, wire them into a workflow graph by calling
//! them with their upstream dependencies, and externalize their configuration
//! with identity preserved.
//!
//! ## Features
//!
//! - **Identified Tasks**: every task gets a UUID and is reachable through a
//!   process-wide weak registry, without the registry keeping it alive
//! - **Call-Style Wiring**: calling a task binds its arguments to declared
//!   parameters and records labelled edges in the flow being built
//! - **Thread-Scoped Context**: flows under construction and runtime
//!   parameters never leak between threads
//! - **Serializable Configuration**: round-trip a task through a flat record
//!   and get the same id back
//!
//! ## Quick Start
//!
//! ```rust
//! use taskwright::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Clone)]
//! struct Scale;
//!
//! impl TaskLogic for Scale {
//!     fn signature(&self) -> Signature {
//!         Signature::new().param("value").optional("factor")
//!     }
//!
//!     fn run(&self, ctx: &RunContext<'_>) -> Result<NodeValue, Signal> {
//!         let value = ctx.inputs.get("value").and_then(|v| v.as_f64()).unwrap_or(0.0);
//!         let factor = ctx.inputs.get("factor").and_then(|v| v.as_f64()).unwrap_or(1.0);
//!         Ok(json!(value * factor))
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn TaskLogic> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let flow = Flow::new("scaling");
//! let scaled = flow.scope(|| {
//!     let input = Parameter::task("value", Some(json!(2.0)), false);
//!     Task::new(Scale).call(CallArgs::new().arg(input).kwarg("factor", 3.0))
//! }).unwrap();
//!
//! assert_eq!(scaled.inputs(), vec!["value", "factor"]);
//! assert_eq!(flow.edges_to(&scaled).len(), 2);
//! ```
//!
//! ## Module Organization
//!
//! - [`identity`]: id generation and the weak task registry
//! - [`context`]: the thread's current flow and runtime parameters
//! - [`triggers`]: built-in trigger predicates
//! - [`prelude`]: Commonly used types and traits (import with `use taskwright::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

pub use core::binding::{CallArgs, Called, Input, bind};
pub use core::constant::Constant;
pub use core::error::{BindingError, BindingErrorKind, SerializationError, SignatureError};
pub use core::flow::{Edge, Flow};
pub use core::parameter::Parameter;
pub use core::serialize::{
    LogicFactory, SerializedTask, register_task_type, register_task_type_of,
};
pub use core::signal::{Signal, State};
pub use core::signature::{Param, Signature};
pub use core::task::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, RunContext, Task, TaskBuilder, TaskConfig,
    TaskLogic,
};
pub use core::trigger::{Trigger, TriggerFn, register_trigger};
pub use core::{AsAny, NodeValue};

pub mod identity {
    //! Task ids and the registry that maps them back to live tasks.
    pub use crate::core::identity::{generate_id, live_count, lookup, register};
}

pub mod context {
    //! The thread-scoped construction and run context.
    pub use crate::core::context::{
        FlowGuard, ParametersGuard, current_flow, enter_parameters, parameters, with_parameters,
    };
}

pub mod triggers {
    //! Built-in triggers.
    pub use crate::core::trigger::{
        ALL_FAILED, ALL_FINISHED, ALL_SUCCESSFUL, ANY_FAILED, ANY_SUCCESSFUL, MANUAL_ONLY,
    };
}

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything you need to define and wire tasks.
///
/// # Example
/// ```rust
/// use taskwright::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        CallArgs, Called, Flow, Input, NodeValue, Parameter, RunContext, Signal, Signature,
        Task, TaskLogic, Trigger, triggers,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate, recorded on every task it builds.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
