//! Concurrent registry of in-memory builds

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::memory::MemoryBuild;

/// Map from build id to its event log
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct BuildRegistry {
    builds: Arc<DashMap<String, MemoryBuild>>,
}

impl BuildRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new, empty build
    pub fn create(&self, build_id: impl Into<String>) -> StorageResult<MemoryBuild> {
        let build = MemoryBuild::new();
        self.insert(build_id, build.clone())?;
        Ok(build)
    }

    /// Register an existing build under `build_id`
    pub fn insert(&self, build_id: impl Into<String>, build: MemoryBuild) -> StorageResult<()> {
        match self.builds.entry(build_id.into()) {
            Entry::Occupied(entry) => Err(StorageError::AlreadyExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(build_id = %entry.key(), events = build.len(), "Registered build");
                entry.insert(build);
                Ok(())
            }
        }
    }

    /// Look up a build by id
    pub fn get(&self, build_id: &str) -> Option<MemoryBuild> {
        self.builds.get(build_id).map(|entry| entry.value().clone())
    }

    /// Ids of all registered builds, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.builds.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of registered builds
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}
