//! The stream pump
//!
//! Drains one build's event cursor onto one client connection. The pump runs
//! as its own task and hands encoded frames to the response body through a
//! bounded channel; the body side of that channel is dropped by the HTTP
//! server when the client goes away, which is the only cancellation signal
//! the pump recognizes.
//!
//! ```text
//!                 ┌──── envelope, write ok ────┐
//!                 ▼                            │
//!   ──► STREAMING ─────────────────────────────┘
//!           │ end-of-stream      → write "end" → ENDED
//!           │ write failed / peer gone         → DISCONNECTED
//!           │ source or encoding error         → FAILED
//!           ▼
//!      cursor released (exactly once)
//! ```

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use atc_core::{Envelope, EventResult, EventSource, EventStreamError};

use crate::encoder::WireEvent;

/// Terminal state of a pump run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The log ended and the `end` event was written
    Ended,
    /// The client went away
    Disconnected,
    /// The source (or encoding) failed; the stream stopped silently
    Failed,
}

/// What a pump run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    pub outcome: PumpOutcome,
    /// Data events written, not counting the `end` event
    pub written: u64,
}

/// Owns a cursor and guarantees it is closed exactly once
///
/// [`release`](Self::release) closes the cursor on the normal path. If the
/// guard is dropped without being released (the pump task was torn down
/// mid-await), the close is spawned onto the current runtime instead.
pub struct CursorGuard {
    source: Option<Box<dyn EventSource>>,
}

impl CursorGuard {
    pub fn new(source: Box<dyn EventSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Pull the next envelope from the guarded cursor
    ///
    /// `None` once the cursor has been handed off for closing.
    pub async fn next(&mut self) -> Option<EventResult<Envelope>> {
        match self.source.as_mut() {
            Some(source) => Some(source.next().await),
            None => None,
        }
    }

    /// Close the cursor
    pub async fn release(mut self) {
        if let Some(source) = self.source.take() {
            close_source(source).await;
        }
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        let Some(source) = self.source.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close_source(source));
            }
            Err(_) => warn!("No runtime available to close event cursor"),
        }
    }
}

async fn close_source(source: Box<dyn EventSource>) {
    if let Err(e) = source.close().await {
        warn!(error = %e, "Failed to close event cursor");
    }
}

/// Stream every event from `source` into `sink`, then close `source`
pub async fn run(source: Box<dyn EventSource>, sink: mpsc::Sender<Bytes>) -> PumpReport {
    let mut cursor = CursorGuard::new(source);
    let report = stream_events(&mut cursor, &sink).await;
    cursor.release().await;

    match report.outcome {
        PumpOutcome::Ended => info!(written = report.written, "Event stream ended"),
        PumpOutcome::Disconnected => {
            debug!(written = report.written, "Client disconnected from event stream")
        }
        PumpOutcome::Failed => {
            debug!(written = report.written, "Event stream stopped after failure")
        }
    }

    report
}

async fn stream_events(cursor: &mut CursorGuard, sink: &mpsc::Sender<Bytes>) -> PumpReport {
    let mut written = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = sink.closed() => return stop(PumpOutcome::Disconnected, written),
            next = cursor.next() => match next {
                Some(next) => next,
                None => return stop(PumpOutcome::Failed, written),
            },
        };

        let event = match next {
            Ok(envelope) => match WireEvent::envelope(written, &envelope) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, event_id = %envelope.event_id, "Failed to encode build event");
                    return stop(PumpOutcome::Failed, written);
                }
            },
            Err(EventStreamError::EndOfStream) => {
                if sink.send(WireEvent::end(written).encode()).await.is_err() {
                    return stop(PumpOutcome::Disconnected, written);
                }
                return stop(PumpOutcome::Ended, written);
            }
            Err(e) => {
                warn!(error = %e, written, "Build event source failed mid-stream");
                return stop(PumpOutcome::Failed, written);
            }
        };

        if sink.send(event.encode()).await.is_err() {
            return stop(PumpOutcome::Disconnected, written);
        }
        written += 1;
    }
}

fn stop(outcome: PumpOutcome, written: u64) -> PumpReport {
    PumpReport { outcome, written }
}
