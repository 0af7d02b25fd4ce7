//! JSONL build fixtures
//!
//! A fixture is a finished build stored as one JSON object per line:
//!
//! ```text
//! {"event":"status","version":"1.0","data":{"status":"started"}}
//! {"event":"log","version":"5.1","data":{"payload":"hello\n"}}
//! ```
//!
//! Blank lines are skipped. Event ids are assigned by position.

use std::path::Path;

use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::{info, warn};

use crate::error::{StorageError, StorageResult};
use crate::memory::MemoryBuild;
use crate::registry::BuildRegistry;

/// File extension of fixture files
pub const FIXTURE_EXTENSION: &str = "jsonl";

#[derive(Debug, Deserialize)]
struct FixtureEvent {
    event: String,
    version: String,
    data: Box<RawValue>,
}

/// Parse fixture text into a finished build
pub fn parse_fixture(path: &Path, contents: &str) -> StorageResult<MemoryBuild> {
    let build = MemoryBuild::new();

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let event: FixtureEvent =
            serde_json::from_str(line).map_err(|e| StorageError::Fixture {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;
        build.append(event.event, event.version, event.data)?;
    }

    build.finish();
    Ok(build)
}

/// Load a single fixture file into a finished build
pub async fn load_fixture(path: impl AsRef<Path>) -> StorageResult<MemoryBuild> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;
    parse_fixture(path, &contents)
}

/// Load every `*.jsonl` file in `dir`, registering each under its file stem
///
/// Returns the number of builds loaded.
pub async fn load_fixture_dir(
    dir: impl AsRef<Path>,
    registry: &BuildRegistry,
) -> StorageResult<usize> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut loaded = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(FIXTURE_EXTENSION) {
            continue;
        }

        let Some(build_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!(path = %path.display(), "Skipping fixture with non UTF-8 name");
            continue;
        };

        let build = load_fixture(&path).await?;
        info!(build_id, events = build.len(), "Loaded build fixture");
        registry.insert(build_id, build)?;
        loaded += 1;
    }

    Ok(loaded)
}
