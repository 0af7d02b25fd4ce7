//! # ATC Storage
//!
//! In-memory event storage for build event streaming.
//!
//! - **MemoryBuild**: append-only event log for one build, with cursors that
//!   wait for new events like a live build
//! - **BuildRegistry**: concurrent map from build id to its log
//! - **Fixtures**: load finished builds from JSONL files
//!
//! ## Example
//!
//! ```rust,ignore
//! use atc_core::{BuildEvents, EventSource};
//! use atc_storage::MemoryBuild;
//!
//! let build = MemoryBuild::new();
//! build.append_payload("log", "5.1", &serde_json::json!({"payload": "hi"}))?;
//! build.finish();
//!
//! let mut cursor = build.events(0).await?;
//! let envelope = cursor.next().await?;
//! assert_eq!(envelope.event_id, "0");
//! cursor.close().await?;
//! ```

pub mod error;
pub mod fixture;
pub mod memory;
pub mod registry;

pub use error::{StorageError, StorageResult};
pub use fixture::{load_fixture, load_fixture_dir, parse_fixture};
pub use memory::{MemoryBuild, MemoryCursor};
pub use registry::BuildRegistry;
