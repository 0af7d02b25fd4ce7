//! Error types for the event streaming server

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while configuring or starting the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Storage error (fixture loading)
    #[error("Storage error: {0}")]
    Storage(#[from] atc_storage::StorageError),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(#[from] atc_logging::LoggingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ServerError {
    fn from(e: toml::de::Error) -> Self {
        ServerError::Config(e.to_string())
    }
}

/// Result type alias for server operations
pub type ServerResult<T> = Result<T, ServerError>;
