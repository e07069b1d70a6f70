// src/cache/mod.rs

//! Change cache: last-seen modification time per file dependency.
//!
//! The cache is loaded once per build by the orchestrator, consulted by every
//! task before it decides whether to run its body, updated by tasks whose body
//! succeeded, and persisted only when the whole build succeeded.
//!
//! - [`ChangeCache`] is the in-memory mapping.
//! - [`store`] reads and writes the JSON file on disk.

pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use store::{CacheStore, DEFAULT_CACHE_FILE};

/// Modification time in nanoseconds since the Unix epoch.
pub type Timestamp = u64;

/// Mapping from file dependency (as declared) to its last-seen timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeCache {
    entries: BTreeMap<String, Timestamp>,
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Timestamp> {
        self.entries.get(path).copied()
    }

    /// True if `path` has an entry equal to `current`.
    pub fn is_unchanged(&self, path: &str, current: Timestamp) -> bool {
        self.get(path) == Some(current)
    }

    pub fn record(&mut self, path: impl Into<String>, timestamp: Timestamp) {
        self.entries.insert(path.into(), timestamp);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Timestamp)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
