// src/engine/orchestrator.rs

use std::sync::Arc;

use tracing::info;

use crate::cache::CacheStore;
use crate::dag::Registry;
use crate::engine::{BuildEnv, BuildOptions, BuildReport, Scheduler, TaskSummary};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// Drives one build invocation end to end.
///
/// 1. Load the change cache (creating an empty one on first use).
/// 2. Start every registered task concurrently.
/// 3. Wait for all of them.
/// 4. Persist the cache if nothing failed; otherwise log every failure and
///    leave the persisted cache untouched.
///
/// The returned [`BuildReport`] carries the exit code; `Err` is reserved for
/// failures of the orchestrator itself (e.g. an unreadable cache file).
#[derive(Debug)]
pub struct Orchestrator {
    registry: Registry,
    options: BuildOptions,
    fs: Arc<dyn FileSystem>,
}

impl Orchestrator {
    pub fn new(registry: Registry, options: BuildOptions) -> Self {
        Self {
            registry,
            options,
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Use a different filesystem (tests use `MockFileSystem`).
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub async fn run(self) -> Result<BuildReport> {
        let store = CacheStore::new(Arc::clone(&self.fs), self.options.cache_path());
        let cache = store.load_or_init()?;

        info!(
            tasks = self.registry.len(),
            force_all = self.options.force_all,
            cached_files = cache.len(),
            cache_file = %store.path().display(),
            "starting build"
        );

        let env = Arc::new(BuildEnv::new(cache, Arc::clone(&self.fs), &self.options));
        let failures = Scheduler::new(Arc::clone(&env)).run_all(self.registry.tasks()).await;

        let report = BuildReport {
            tasks: self
                .registry
                .tasks()
                .iter()
                .map(|t| TaskSummary {
                    name: t.name().to_string(),
                    state: t.state(),
                })
                .collect(),
            failures,
        };

        if report.is_success() {
            store.persist(&env.cache_snapshot())?;
            info!("build succeeded");
        } else {
            report.log_failures();
        }

        Ok(report)
    }
}
