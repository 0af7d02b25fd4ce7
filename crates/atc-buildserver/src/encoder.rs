//! Server-Sent Events framing
//!
//! Each wire event carries a connection-local sequence id, an event name, and
//! a data field:
//!
//! ```text
//! id: 0
//! event: event
//! data: {"data":{"event":1},"event":"fake","version":"42.0","event_id":"1"}
//!
//! id: 1
//! event: end
//! data:
//!
//! ```
//!
//! The id is the number of events already written on this connection, not
//! the envelope's own `event_id` (which travels inside the JSON payload).

use bytes::Bytes;

use atc_core::{Envelope, EventResult};

/// Event name of a data event
pub const EVENT_NAME: &str = "event";

/// Event name of the terminal marker sent when the build's log has ended
pub const END_EVENT_NAME: &str = "end";

/// One Server-Sent Event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    pub id: u64,
    pub name: String,
    pub data: String,
}

impl WireEvent {
    /// A data event wrapping `envelope`
    pub fn envelope(id: u64, envelope: &Envelope) -> EventResult<Self> {
        Ok(Self {
            id,
            name: EVENT_NAME.to_string(),
            data: envelope.to_json()?,
        })
    }

    /// The terminal `end` event, with empty data
    pub fn end(id: u64) -> Self {
        Self {
            id,
            name: END_EVENT_NAME.to_string(),
            data: String::new(),
        }
    }

    /// Whether this is the terminal `end` event
    pub fn is_end(&self) -> bool {
        self.name == END_EVENT_NAME
    }

    /// Encode into SSE framing
    ///
    /// Multi-line data is split across several `data:` lines. Empty data
    /// still gets one `data:` line so that clients dispatch the event.
    pub fn encode(&self) -> Bytes {
        let mut frame = format!("id: {}\nevent: {}\n", self.id, self.name);
        for line in data_lines(&self.data) {
            frame.push_str("data: ");
            frame.push_str(line);
            frame.push('\n');
        }
        frame.push('\n');
        Bytes::from(frame)
    }
}

/// Split on SSE line breaks: `\r\n`, `\n`, or a lone `\r`
fn data_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split('\n').flat_map(|line| {
        line.strip_suffix('\r').unwrap_or(line).split('\r')
    })
}
