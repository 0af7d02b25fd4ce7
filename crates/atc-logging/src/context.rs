//! Per-stream request context
//!
//! Every event-stream request gets a [`StreamContext`] carrying a fresh
//! request id. Its span is entered for the whole lifetime of the stream,
//! including the pump task, so every log line from one client connection
//! can be correlated.

use tracing::{Span, info_span};
use uuid::Uuid;

/// Standard span names
pub mod spans {
    /// Span covering one event-stream request, from open to cursor release
    pub const EVENT_STREAM: &str = "event_stream";
}

/// Correlation data for one event-stream request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamContext {
    /// Unique id of this request
    pub request_id: Uuid,
    /// Build being streamed, when known to the routing layer
    pub build_id: Option<String>,
}

impl StreamContext {
    /// Create a context with a fresh request id
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            build_id: None,
        }
    }

    /// Attach the build id
    pub fn with_build(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = Some(build_id.into());
        self
    }

    /// Create the `event_stream` span for this request
    pub fn span(&self, from_offset: u64) -> Span {
        info_span!(
            spans::EVENT_STREAM,
            request_id = %self.request_id,
            build_id = self.build_id.as_deref(),
            from_offset,
        )
    }
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::new()
    }
}
