use std::fmt;

/// Result type for modelgate-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or validating domain values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A request field failed validation
    InvalidInput(String),

    /// Operation name is not one of summarize, translate, classify
    UnknownOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::UnknownOperation(name) => write!(
                f,
                "Unknown operation '{}' (expected one of: summarize, translate, classify)",
                name
            ),
        }
    }
}

impl std::error::Error for Error {}
