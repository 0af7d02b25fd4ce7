//! Error types for build event streaming

use thiserror::Error;

/// Errors produced while opening or reading a build's event stream
#[derive(Debug, Error)]
pub enum EventStreamError {
    /// No more events will ever arrive for this build.
    ///
    /// This is a sentinel, not a failure: readers treat it as normal
    /// termination of the stream.
    #[error("end of build event stream")]
    EndOfStream,

    /// The event source could not be opened
    #[error("event source unavailable: {0}")]
    Unavailable(String),

    /// Reading the next event failed
    #[error("event source read failed: {0}")]
    Read(String),

    /// An envelope could not be serialized
    #[error("event encoding failed: {0}")]
    Encoding(String),
}

impl EventStreamError {
    /// Create a new Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new Read error
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Whether this is the end-of-stream sentinel
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

impl From<serde_json::Error> for EventStreamError {
    fn from(err: serde_json::Error) -> Self {
        EventStreamError::Encoding(err.to_string())
    }
}

/// Result type alias for event stream operations
pub type EventResult<T> = Result<T, EventStreamError>;
