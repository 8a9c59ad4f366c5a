use modelgate_types::Operation;
use std::fmt;
use std::time::Duration;

/// Result type for modelgate-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to materialize a model handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// No artifacts exist for the key
    NotFound { key: String, path: String },

    /// Artifacts exist but the backend could not construct the model
    LoadFailure { key: String, reason: String },
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::NotFound { key, path } => {
                write!(f, "Model '{}' not found at {}", key, path)
            }
            ProvisionError::LoadFailure { key, reason } => {
                write!(f, "Failed to load model '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

/// Failure while generating text with a resident model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    Backend(String),
    Timeout(Duration),
    /// The generation pool was shut down
    WorkerUnavailable,
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Backend(msg) => write!(f, "Inference backend error: {}", msg),
            InferenceError::Timeout(limit) => {
                write!(f, "Inference timed out after {}s", limit.as_secs_f64())
            }
            InferenceError::WorkerUnavailable => write!(f, "Inference worker pool is unavailable"),
        }
    }
}

impl std::error::Error for InferenceError {}

/// Cause carried by an orchestration failure.
#[derive(Debug)]
pub enum OrchestrationCause {
    Provision(ProvisionError),
    Inference(InferenceError),
}

impl fmt::Display for OrchestrationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationCause::Provision(err) => err.fmt(f),
            OrchestrationCause::Inference(err) => err.fmt(f),
        }
    }
}

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Caller-supplied field failed validation
    InvalidInput(String),

    /// Request text exceeds the operation's hard character cap
    InputTooLarge {
        operation: Operation,
        length: usize,
        limit: usize,
    },

    /// Daily quota for the operation is used up
    QuotaExceeded {
        operation: Operation,
        used: u64,
        limit: u64,
    },

    /// Operation has no backing model
    Configuration(String),

    /// Model provisioning or inference failed
    Orchestration {
        operation: Operation,
        cause: OrchestrationCause,
    },

    /// Ledger layer error
    Ledger(modelgate_ledger::Error),

    /// Configuration file error
    Config(String),

    /// IO operation failed
    Io(std::io::Error),

    /// Anything else (panicked worker, poisoned lock, ...)
    Internal(String),
}

impl Error {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::InputTooLarge { .. } => "input_too_large",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::Configuration(_) => "configuration_error",
            Error::Orchestration { .. } => "orchestration_error",
            Error::Ledger(_) | Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// Message safe to hand to a remote caller.
    pub fn public_message(&self) -> String {
        match self {
            Error::Orchestration { operation, .. } => {
                format!("The {} operation is temporarily unavailable", operation)
            }
            Error::Ledger(_) | Error::Io(_) | Error::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    pub(crate) fn provision(operation: Operation, err: ProvisionError) -> Self {
        Error::Orchestration {
            operation,
            cause: OrchestrationCause::Provision(err),
        }
    }

    pub(crate) fn inference(operation: Operation, err: InferenceError) -> Self {
        Error::Orchestration {
            operation,
            cause: OrchestrationCause::Inference(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::InputTooLarge {
                operation,
                length,
                limit,
            } => write!(
                f,
                "Input for {} is {} characters, exceeding the limit of {}",
                operation, length, limit
            ),
            Error::QuotaExceeded {
                operation,
                used,
                limit,
            } => write!(
                f,
                "Daily quota for {} exceeded ({}/{} requests used)",
                operation, used, limit
            ),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::Orchestration { operation, cause } => {
                write!(f, "{} failed: {}", operation, cause)
            }
            Error::Ledger(err) => write!(f, "Ledger error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Orchestration { cause, .. } => match cause {
                OrchestrationCause::Provision(err) => Some(err),
                OrchestrationCause::Inference(err) => Some(err),
            },
            Error::Ledger(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::InvalidInput(_)
            | Error::InputTooLarge { .. }
            | Error::QuotaExceeded { .. }
            | Error::Configuration(_)
            | Error::Config(_)
            | Error::Internal(_) => None,
        }
    }
}

impl From<modelgate_types::Error> for Error {
    fn from(err: modelgate_types::Error) -> Self {
        match err {
            modelgate_types::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            other => Error::InvalidInput(other.to_string()),
        }
    }
}

impl From<modelgate_ledger::Error> for Error {
    fn from(err: modelgate_ledger::Error) -> Self {
        Error::Ledger(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("worker task failed: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        let quota = Error::QuotaExceeded {
            operation: Operation::Classify,
            used: 2,
            limit: 2,
        };
        assert_eq!(quota.kind(), "quota_exceeded");
        assert_eq!(
            quota.to_string(),
            "Daily quota for classify exceeded (2/2 requests used)"
        );

        let large = Error::InputTooLarge {
            operation: Operation::Summarize,
            length: 8001,
            limit: 8000,
        };
        assert_eq!(large.kind(), "input_too_large");
        assert_eq!(Error::Internal("x".into()).kind(), "internal_error");
    }

    #[test]
    fn test_public_message_hides_cause() {
        let err = Error::provision(
            Operation::Translate,
            ProvisionError::NotFound {
                key: "qwen-translate".to_string(),
                path: "/secret/models/qwen-translate".to_string(),
            },
        );
        assert_eq!(err.kind(), "orchestration_error");
        assert!(!err.public_message().contains("/secret"));
        assert!(err.to_string().contains("/secret"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_types_error_becomes_invalid_input() {
        let err: Error = modelgate_types::Error::InvalidInput("bad".to_string()).into();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "bad"));

        let err: Error = modelgate_types::Error::UnknownOperation("dance".to_string()).into();
        assert_eq!(err.kind(), "invalid_input");
    }
}
