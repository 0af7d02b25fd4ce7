//! # ATC Build Server: event streams
//!
//! Serves a build's append-only event log as a resumable Server-Sent Events
//! stream.
//!
//! - [`handler`]: HTTP entry point. Resolves `Last-Event-ID`, opens the
//!   cursor, sets the stream headers. Gzips the stream on request.
//! - [`pump`]: drains the cursor onto the response and always closes it.
//! - [`encoder`]: SSE framing of envelopes and the terminal `end` event.
//! - [`routes`]: maps `/api/v1/builds/{build_id}/events` onto a registry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atc_buildserver::EventStreamHandler;
//! use atc_storage::MemoryBuild;
//!
//! let build = MemoryBuild::new();
//! let app = EventStreamHandler::new(Arc::new(build.clone())).into_router();
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod handler;
pub mod pump;
pub mod routes;

pub use config::ServerConfig;
pub use encoder::WireEvent;
pub use error::{ServerError, ServerResult};
pub use handler::{EventStreamHandler, compression_layer, resume_offset};
pub use pump::{CursorGuard, PumpOutcome, PumpReport};
pub use routes::{AppState, router};
