use thiserror::Error;

/// What went wrong while binding call arguments to a task's signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingErrorKind {
    /// A required parameter received no value.
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    /// The same parameter was bound more than once.
    #[error("multiple values for argument '{0}'")]
    MultipleValues(String),

    /// A keyword matched no parameter and the signature has no capture.
    #[error("unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    /// More positional arguments than positional parameters.
    #[error("takes {expected} positional argument(s) but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    /// The declared signature itself is malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(SignatureError),
}

/// Raised synchronously when a task call cannot be turned into graph edges.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot bind arguments for task \"{task}\": {kind}")]
pub struct BindingError {
    pub task: String,
    pub kind: BindingErrorKind,
}

impl BindingError {
    pub fn new(task: impl Into<String>, kind: BindingErrorKind) -> Self {
        Self {
            task: task.into(),
            kind,
        }
    }

    /// The parameter or keyword the error is about, if any.
    pub fn argument(&self) -> Option<&str> {
        match &self.kind {
            BindingErrorKind::MissingArgument(name)
            | BindingErrorKind::MultipleValues(name)
            | BindingErrorKind::UnexpectedKeyword(name) => Some(name),
            BindingErrorKind::TooManyPositional { .. } | BindingErrorKind::InvalidSignature(_) => {
                None
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("unknown task type: {0}")]
    UnknownType(String),

    #[error("unknown trigger: {0}")]
    UnknownTrigger(String),

    #[error("invalid state for task type {task_type}: {source}")]
    InvalidState {
        task_type: String,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("empty parameter name at position {0}")]
    EmptyName(usize),

    #[error("invalid parameter name: {0}")]
    InvalidName(String),

    #[error("duplicate parameter name: {0}")]
    Duplicate(String),

    #[error("required parameter '{0}' follows an optional one")]
    RequiredAfterOptional(String),

    #[error("parameter '{0}' follows the keyword capture")]
    AfterCapture(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_error_message_names_task_and_argument() {
        let err = BindingError::new("adder", BindingErrorKind::MissingArgument("y".into()));
        assert_eq!(
            err.to_string(),
            "cannot bind arguments for task \"adder\": missing required argument 'y'"
        );
        assert_eq!(err.argument(), Some("y"));
    }

    #[test]
    fn test_kind_messages() {
        let kind = BindingErrorKind::TooManyPositional {
            expected: 2,
            given: 3,
        };
        assert_eq!(
            kind.to_string(),
            "takes 2 positional argument(s) but 3 were given"
        );

        let kind = BindingErrorKind::InvalidSignature(SignatureError::Duplicate("x".into()));
        assert_eq!(kind.to_string(), "invalid signature: duplicate parameter name: x");
        assert_eq!(BindingError::new("t", kind).argument(), None);
    }
}
