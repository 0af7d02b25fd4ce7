//! In-memory build event logs
//!
//! [`MemoryBuild`] is an append-only event log for a single build. Cursors
//! opened on it block until the next event is appended or the build
//! finishes, which makes it behave like a live build for streaming clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::value::RawValue;
use tokio::sync::Notify;
use tracing::{debug, trace};

use atc_core::{BuildEvents, Envelope, EventResult, EventSource, EventStreamError};

use crate::error::{StorageError, StorageResult};

#[derive(Debug, Default)]
struct EventLogState {
    events: Vec<Envelope>,
    finished: bool,
    failure: Option<String>,
}

#[derive(Debug, Default)]
struct Shared {
    log: RwLock<EventLogState>,
    /// Woken on every append, finish, or failure
    changed: Notify,
    open_cursors: AtomicUsize,
}

/// Append-only event log for one build
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuild {
    shared: Arc<Shared>,
}

impl MemoryBuild {
    /// Create an empty, in-progress build
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event with an already-serialized payload
    ///
    /// Event ids are positions in the log: `0`, `1`, `2`, ...
    pub fn append(
        &self,
        event: impl Into<String>,
        version: impl Into<String>,
        data: Box<RawValue>,
    ) -> StorageResult<u64> {
        let event_id = {
            let mut log = self.shared.log.write();
            if log.finished {
                return Err(StorageError::Finished);
            }
            let event_id = log.events.len() as u64;
            log.events
                .push(Envelope::new(event, version, data, event_id.to_string()));
            event_id
        };

        trace!(event_id, "Appended build event");
        self.shared.changed.notify_waiters();
        Ok(event_id)
    }

    /// Append an event, serializing its payload
    pub fn append_payload<T: Serialize + ?Sized>(
        &self,
        event: impl Into<String>,
        version: impl Into<String>,
        payload: &T,
    ) -> StorageResult<u64> {
        let data = serde_json::value::to_raw_value(payload)?;
        self.append(event, version, data)
    }

    /// Mark the build as finished
    ///
    /// Cursors that reach the end of the log afterwards see end-of-stream.
    pub fn finish(&self) {
        self.shared.log.write().finished = true;
        debug!(events = self.len(), "Build finished");
        self.shared.changed.notify_waiters();
    }

    /// Make open cursors fail once they have read the events logged so far
    pub fn fail_with(&self, message: impl Into<String>) {
        self.shared.log.write().failure = Some(message.into());
        self.shared.changed.notify_waiters();
    }

    /// Number of events in the log
    pub fn len(&self) -> usize {
        self.shared.log.read().events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the build has finished
    pub fn is_finished(&self) -> bool {
        self.shared.log.read().finished
    }

    /// Number of cursors opened and not yet closed
    pub fn open_cursors(&self) -> usize {
        self.shared.open_cursors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildEvents for MemoryBuild {
    async fn events(&self, from: u64) -> EventResult<Box<dyn EventSource>> {
        let open = self.shared.open_cursors.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(from, open_cursors = open, "Opened build event cursor");

        Ok(Box::new(MemoryCursor {
            shared: Arc::clone(&self.shared),
            position: from,
        }))
    }
}

/// Cursor over a [`MemoryBuild`]
#[derive(Debug)]
pub struct MemoryCursor {
    shared: Arc<Shared>,
    position: u64,
}

impl MemoryCursor {
    /// Position of the next event this cursor will return
    pub fn position(&self) -> u64 {
        self.position
    }

    fn read_next(&mut self) -> Option<EventResult<Envelope>> {
        let log = self.shared.log.read();

        let next = usize::try_from(self.position)
            .ok()
            .and_then(|index| log.events.get(index));
        if let Some(envelope) = next {
            let envelope = envelope.clone();
            self.position += 1;
            return Some(Ok(envelope));
        }

        if let Some(message) = &log.failure {
            return Some(Err(EventStreamError::read(message.clone())));
        }

        if log.finished {
            return Some(Err(EventStreamError::EndOfStream));
        }

        None
    }
}

#[async_trait]
impl EventSource for MemoryCursor {
    async fn next(&mut self) -> EventResult<Envelope> {
        let shared = Arc::clone(&self.shared);
        loop {
            // Register for wakeups before checking the log so an append
            // between the check and the await is not missed.
            let changed = shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if let Some(result) = self.read_next() {
                return result;
            }

            changed.await;
        }
    }

    async fn close(self: Box<Self>) -> EventResult<()> {
        let open = self.shared.open_cursors.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(position = self.position, open_cursors = open, "Closed build event cursor");
        Ok(())
    }
}
