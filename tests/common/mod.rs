#![allow(dead_code)]

use std::sync::Arc;

use taskforge::fs::mock::MockFileSystem;
use taskforge::{BuildOptions, BuildReport, Orchestrator, Registry};

pub use taskforge_test_utils::{init_tracing, with_timeout};

/// Run one build against the in-memory filesystem.
pub async fn build_with(fs: &MockFileSystem, registry: Registry, options: BuildOptions) -> BuildReport {
    init_tracing();
    let orchestrator = Orchestrator::new(registry, options).with_fs(Arc::new(fs.clone()));
    with_timeout(orchestrator.run()).await.expect("orchestrator error")
}

pub async fn build(fs: &MockFileSystem, registry: Registry) -> BuildReport {
    build_with(fs, registry, BuildOptions::default()).await
}
