//! Error types for atc-storage

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during storage operations
    #[error("I/O error: {0}")]
    Io(String),

    /// The build has finished; its event log is sealed
    #[error("build has already finished")]
    Finished,

    /// A build with this id is already registered
    #[error("build already exists: {0}")]
    AlreadyExists(String),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A fixture file contained a malformed line
    #[error("invalid fixture {}:{line}: {message}", .path.display())]
    Fixture {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
