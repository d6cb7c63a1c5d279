use thiserror::Error;

use crate::core::NodeValue;

/// The non-success outcomes a work function can report.
///
/// `Fail`, `Wait`, `Skip` and `Success` are controlled signals: the execution
/// engine applies its retry and trigger policy to them. `Error` is an
/// unexpected failure of the work function itself.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Signal {
    #[error("FAIL: {0}")]
    Fail(String),

    #[error("WAIT: {0}")]
    Wait(String),

    #[error("SKIP: {0}")]
    Skip(String),

    /// Ends the task successfully with the given result.
    #[error("SUCCESS")]
    Success(NodeValue),

    #[error("unexpected error: {0}")]
    Error(String),
}

impl Signal {
    pub fn fail(message: impl Into<String>) -> Self {
        Signal::Fail(message.into())
    }

    pub fn is_controlled(&self) -> bool {
        !matches!(self, Signal::Error(_))
    }

    /// The state a task is placed in when it raises this signal.
    pub fn state(&self) -> State {
        match self {
            Signal::Fail(_) | Signal::Error(_) => State::Failed,
            Signal::Wait(_) => State::Waiting,
            Signal::Skip(_) => State::Skipped,
            Signal::Success(_) => State::Success,
        }
    }
}

/// The state of an upstream task as seen by a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Running,
    Waiting,
    Success,
    Failed,
    Skipped,
}

impl State {
    pub fn is_finished(self) -> bool {
        matches!(self, State::Success | State::Failed | State::Skipped)
    }

    /// Skipped tasks count as successful for trigger purposes.
    pub fn is_successful(self) -> bool {
        matches!(self, State::Success | State::Skipped)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, State::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controlled_vs_unexpected() {
        assert!(Signal::fail("missing").is_controlled());
        assert!(Signal::Wait("later".into()).is_controlled());
        assert!(!Signal::Error("boom".into()).is_controlled());
    }

    #[test]
    fn test_signal_states() {
        assert_eq!(Signal::fail("x").state(), State::Failed);
        assert_eq!(Signal::Skip("x".into()).state(), State::Skipped);
        assert!(Signal::Skip("x".into()).state().is_successful());
        assert!(!State::Running.is_finished());
    }

    #[test]
    fn test_fail_message() {
        assert_eq!(Signal::fail("no input").to_string(), "FAIL: no input");
    }
}
