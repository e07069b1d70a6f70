// src/engine/mod.rs

//! Build orchestration.
//!
//! - [`scheduler`] starts every registered task concurrently and collects
//!   their outcomes. It does no ordering of its own; each task waits on its
//!   own dependencies.
//! - [`orchestrator`] drives one build end to end: load the change cache, run
//!   the scheduler, persist the cache on success, report failures otherwise.
//!
//! [`BuildEnv`] is the per-build state shared by all running tasks.

pub mod orchestrator;
pub mod report;
pub mod scheduler;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::{ChangeCache, DEFAULT_CACHE_FILE, Timestamp};
use crate::fs::FileSystem;

pub use orchestrator::Orchestrator;
pub use report::{BuildReport, TaskSummary};
pub use scheduler::Scheduler;

/// Build configuration passed explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory file dependencies are resolved against and commands run in.
    /// Empty means the current working directory.
    pub root: PathBuf,
    /// Run every body regardless of the change cache (`--build-anyway`).
    pub force_all: bool,
    /// Cache file location, relative to `root` unless absolute.
    pub cache_file: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            force_all: false,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
        }
    }
}

impl BuildOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn force_all(mut self, force_all: bool) -> Self {
        self.force_all = force_all;
        self
    }

    pub fn cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(&self.cache_file)
    }
}

/// State shared by every task of one build.
///
/// The cache mutex is only ever held for short, synchronous sections.
#[derive(Debug)]
pub struct BuildEnv {
    cache: Mutex<ChangeCache>,
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    force_all: bool,
}

impl BuildEnv {
    pub fn new(cache: ChangeCache, fs: Arc<dyn FileSystem>, options: &BuildOptions) -> Self {
        Self {
            cache: Mutex::new(cache),
            fs,
            root: options.root.clone(),
            force_all: options.force_all,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn force_all(&self) -> bool {
        self.force_all
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, ChangeCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the cache as it stands now.
    pub fn cache_snapshot(&self) -> ChangeCache {
        self.cache().clone()
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    pub(crate) fn exists(&self, path: &str) -> bool {
        self.fs.exists(&self.resolve(path))
    }

    pub(crate) fn modified(&self, path: &str) -> anyhow::Result<Timestamp> {
        self.fs.modified(&self.resolve(path))
    }
}
