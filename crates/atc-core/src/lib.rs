//! # ATC Core
//!
//! Core traits, types, and errors for streaming a build's event log.
//!
//! The event-stream handler never talks to a concrete storage engine. It sees
//! a build only through [`BuildEvents`], which opens an [`EventSource`] at a
//! resume offset, and pulls [`Envelope`]s from that cursor until it reports
//! [`EventStreamError::EndOfStream`].
//!
//! ## Key Traits
//!
//! - [`BuildEvents`]: a build whose event log can be read from an offset
//! - [`EventSource`]: a single-use, sequential cursor over one build's events
//!
//! ## Key Types
//!
//! - [`Envelope`]: one build event as transmitted to clients
//! - [`EventStreamError`]: cursor errors, including the end-of-stream sentinel

pub mod envelope;
pub mod error;
pub mod traits;

pub use envelope::*;
pub use error::*;
pub use traits::*;
