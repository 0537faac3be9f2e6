use thiserror::Error;

/// Result type for enhancement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for enhancement operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unsupported transform configuration
    #[error("Unsupported transform size: {0} (must be a power of two in range)")]
    UnsupportedTransformSize(usize),

    /// Filter design error
    #[error("Filter design error: {0}")]
    FilterDesign(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
