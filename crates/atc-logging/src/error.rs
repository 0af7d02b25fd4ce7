//! Error types for logging setup

use thiserror::Error;

/// Errors that can occur while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber was already set
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// The log file or directory could not be created
    #[error("log file error: {0}")]
    File(String),
}

impl From<std::io::Error> for LoggingError {
    fn from(err: std::io::Error) -> Self {
        LoggingError::File(err.to_string())
    }
}

/// Result type alias for logging setup
pub type LoggingResult<T> = Result<T, LoggingError>;
