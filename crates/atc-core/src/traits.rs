//! Core traits for build event streaming
//!
//! ## Key Traits
//!
//! - [`BuildEvents`]: opens cursors into one build's event log
//! - [`EventSource`]: the cursor itself

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::EventResult;

/// A sequential, resumable reader over one build's events
///
/// A cursor is single-use and owned by exactly one reader. `close` consumes
/// the cursor, so it can run at most once and never while a `next` call is
/// still borrowing it.
#[async_trait]
pub trait EventSource: Send {
    /// Pull the next envelope after the cursor's current position
    ///
    /// Waits until an envelope is available, the stream is known to have
    /// ended ([`EventStreamError::EndOfStream`]), or an error occurs.
    ///
    /// Implementations must be cancel-safe: if the returned future is
    /// dropped before completing, no envelope is lost and the cursor stays
    /// at the same position.
    ///
    /// [`EventStreamError::EndOfStream`]: crate::EventStreamError::EndOfStream
    async fn next(&mut self) -> EventResult<Envelope>;

    /// Release the cursor's underlying resources
    async fn close(self: Box<Self>) -> EventResult<()>;
}

/// A build whose event log can be streamed
#[async_trait]
pub trait BuildEvents: Send + Sync {
    /// Open a cursor positioned after the first `from` events
    ///
    /// `from` is the number of events the reader has already consumed, so
    /// zero reads the log from the beginning.
    async fn events(&self, from: u64) -> EventResult<Box<dyn EventSource>>;
}

#[async_trait]
impl<T: BuildEvents + ?Sized> BuildEvents for Arc<T> {
    async fn events(&self, from: u64) -> EventResult<Box<dyn EventSource>> {
        (**self).events(from).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventStreamError;

    /// Test that the traits are object-safe
    fn _assert_object_safe(_: &dyn EventSource, _: &dyn BuildEvents) {}

    struct Countdown {
        remaining: u64,
    }

    #[async_trait]
    impl EventSource for Countdown {
        async fn next(&mut self) -> EventResult<Envelope> {
            if self.remaining == 0 {
                return Err(EventStreamError::EndOfStream);
            }
            self.remaining -= 1;
            Envelope::from_payload("tick", "1.0", &self.remaining, self.remaining.to_string())
        }

        async fn close(self: Box<Self>) -> EventResult<()> {
            Ok(())
        }
    }

    struct CountdownBuild;

    #[async_trait]
    impl BuildEvents for CountdownBuild {
        async fn events(&self, from: u64) -> EventResult<Box<dyn EventSource>> {
            Ok(Box::new(Countdown {
                remaining: 3u64.saturating_sub(from),
            }))
        }
    }

    #[test]
    fn test_arc_build_opens_cursor() {
        tokio_test::block_on(async {
            let build: Arc<dyn BuildEvents> = Arc::new(CountdownBuild);
            let mut cursor = build.events(1).await.unwrap();

            assert_eq!(cursor.next().await.unwrap().event_id, "1");
            assert_eq!(cursor.next().await.unwrap().event_id, "0");
            assert!(cursor.next().await.unwrap_err().is_end_of_stream());

            cursor.close().await.unwrap();
        });
    }
}
