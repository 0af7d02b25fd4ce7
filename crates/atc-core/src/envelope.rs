//! Build event envelopes

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::EventResult;

/// One build event as transmitted to clients
///
/// The field order is part of the wire contract: envelopes serialize to a
/// JSON object with exactly the keys `data`, `event`, `version`, `event_id`,
/// in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Opaque payload, embedded verbatim
    pub data: Box<RawValue>,
    /// Event type tag
    pub event: String,
    /// Schema version of this event (not the transport protocol version)
    pub version: String,
    /// Stream-unique, numerically ordered id; also the resumption token
    pub event_id: String,
}

impl Envelope {
    /// Create an envelope around an already-serialized payload
    pub fn new(
        event: impl Into<String>,
        version: impl Into<String>,
        data: Box<RawValue>,
        event_id: impl Into<String>,
    ) -> Self {
        Self {
            data,
            event: event.into(),
            version: version.into(),
            event_id: event_id.into(),
        }
    }

    /// Create an envelope by serializing a payload
    pub fn from_payload<T: Serialize + ?Sized>(
        event: impl Into<String>,
        version: impl Into<String>,
        payload: &T,
        event_id: impl Into<String>,
    ) -> EventResult<Self> {
        let data = serde_json::value::to_raw_value(payload)?;
        Ok(Self::new(event, version, data, event_id))
    }

    /// Raw JSON text of the payload
    pub fn payload(&self) -> &str {
        self.data.get()
    }

    /// The event id as a number, if it is one
    pub fn sequence(&self) -> Option<u64> {
        self.event_id.parse().ok()
    }

    /// Serialize to the JSON object carried in a wire event's data field
    pub fn to_json(&self) -> EventResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
