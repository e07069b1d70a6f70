mod common;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskforge::cache::{CacheStore, DEFAULT_CACHE_FILE};
use taskforge::fs::FileSystem;
use taskforge::fs::mock::MockFileSystem;
use taskforge::{deps, BuildError, BuildOptions, Registry, TaskHandle, TaskState};
use taskforge_test_utils::builders::{counting_task, RegistryBuilder};

use common::{build, build_with};

struct Scenario {
    registry: Registry,
    b: TaskHandle,
    a_runs: Arc<AtomicUsize>,
    b_runs: Arc<AtomicUsize>,
}

/// Task A has no dependencies; task B depends on A and on `in.txt`.
fn scenario() -> Scenario {
    let mut registry = Registry::new();
    let (a, a_runs) = counting_task(&mut registry, "A", deps![]);
    let (b, b_runs) = counting_task(&mut registry, "B", deps![&a, "in.txt"]);
    Scenario {
        registry,
        b,
        a_runs,
        b_runs,
    }
}

fn cached(fs: &MockFileSystem, path: &str) -> Option<u64> {
    CacheStore::new(Arc::new(fs.clone()), DEFAULT_CACHE_FILE)
        .load_or_init()
        .unwrap()
        .get(path)
}

#[tokio::test]
async fn skips_unchanged_inputs_across_runs() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");

    // Run 1: empty cache, both bodies run.
    let s = scenario();
    let report = build(&fs, s.registry).await;
    assert_eq!(report.exit_code(), 0);
    assert_eq!(s.a_runs.load(Ordering::SeqCst), 1);
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 1);
    let first = fs.modified(Path::new("in.txt")).unwrap();
    assert_eq!(cached(&fs, "in.txt"), Some(first));

    // Run 2: in.txt unchanged, A always runs, B is skipped.
    let s = scenario();
    let report = build(&fs, s.registry).await;
    assert!(report.is_success());
    assert_eq!(s.a_runs.load(Ordering::SeqCst), 1);
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 0);
    assert_eq!(report.state_of("B"), Some(TaskState::Skipped));
    assert_eq!(report.state_of("A"), Some(TaskState::Succeeded));

    // Run 3: in.txt touched, B runs again and the cache follows.
    fs.touch("in.txt");
    let second = fs.modified(Path::new("in.txt")).unwrap();
    assert_ne!(first, second);

    let s = scenario();
    let report = build(&fs, s.registry).await;
    assert!(report.is_success());
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 1);
    assert_eq!(cached(&fs, "in.txt"), Some(second));
}

#[tokio::test]
async fn global_force_runs_every_body() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");
    build(&fs, scenario().registry).await;

    let s = scenario();
    let report = build_with(&fs, s.registry, BuildOptions::default().force_all(true)).await;
    assert!(report.is_success());
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 1);
    assert_eq!(report.state_of("B"), Some(TaskState::Succeeded));
}

#[tokio::test]
async fn per_task_force_runs_that_body() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");
    build(&fs, scenario().registry).await;

    let s = scenario();
    s.b.mark_force();
    let report = build(&fs, s.registry).await;
    assert!(report.is_success());
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn task_without_file_deps_runs_every_time() {
    let fs = MockFileSystem::new();
    for _ in 0..3 {
        let mut registry = Registry::new();
        let (_, runs) = counting_task(&mut registry, "always", deps![]);
        build(&fs, registry).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn any_changed_file_reruns_the_body() {
    let fs = MockFileSystem::new();
    fs.add_file("a.c", "a");
    fs.add_file("b.c", "b");

    let register = || {
        let mut registry = Registry::new();
        let (_, runs) = counting_task(&mut registry, "compile", deps!["a.c", "b.c"]);
        (registry, runs)
    };

    let (registry, runs) = register();
    build(&fs, registry).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let (registry, runs) = register();
    build(&fs, registry).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    fs.touch("b.c");
    let (registry, runs) = register();
    build(&fs, registry).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_build_leaves_cache_unpersisted() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");

    let mut builder = RegistryBuilder::new();
    builder.task("B", deps!["in.txt"]);
    builder.failing_task("boom", deps![], "broken on purpose");
    let (registry, log) = builder.build();

    let report = build(&fs, registry).await;
    assert_eq!(report.exit_code(), 1);
    assert_eq!(log.starts("B"), 1);
    assert_eq!(report.state_of("B"), Some(TaskState::Succeeded));
    assert_eq!(fs.read_to_string(Path::new(DEFAULT_CACHE_FILE)).unwrap(), "{}");

    // Next build re-validates B instead of skipping it.
    let mut builder = RegistryBuilder::new();
    builder.task("B", deps!["in.txt"]);
    let (registry, log) = builder.build();
    build(&fs, registry).await;
    assert_eq!(log.starts("B"), 1);
}

#[tokio::test]
async fn custom_cache_location_is_used() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");

    let options = BuildOptions::default().cache_file("out/state.json");
    let s = scenario();
    build_with(&fs, s.registry, options.clone()).await;
    assert!(fs.exists(Path::new("out/state.json")));
    assert!(!fs.exists(Path::new(DEFAULT_CACHE_FILE)));

    let s = scenario();
    build_with(&fs, s.registry, options).await;
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn older_timestamp_still_counts_as_a_change() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");
    build(&fs, scenario().registry).await;

    let recorded = cached(&fs, "in.txt").unwrap();
    fs.set_modified("in.txt", recorded - 1);

    let s = scenario();
    let report = build(&fs, s.registry).await;
    assert!(report.is_success());
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 1);
    assert_eq!(cached(&fs, "in.txt"), Some(recorded - 1));
}

#[tokio::test]
async fn input_removed_after_a_cached_build_fails_the_task() {
    let fs = MockFileSystem::new();
    fs.add_file("in.txt", "v1");
    build(&fs, scenario().registry).await;
    let recorded = cached(&fs, "in.txt");

    fs.remove("in.txt");
    let s = scenario();
    let report = build(&fs, s.registry).await;

    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        &report.failures[..],
        [BuildError::MissingDependency { task, path }] if task == "B" && path == "in.txt"
    ));
    assert_eq!(s.a_runs.load(Ordering::SeqCst), 1);
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 0);
    assert_eq!(cached(&fs, "in.txt"), recorded);
}

#[tokio::test]
async fn forcing_does_not_bypass_missing_file_dependencies() {
    let fs = MockFileSystem::new();

    let s = scenario();
    let report = build_with(&fs, s.registry, BuildOptions::default().force_all(true)).await;
    assert!(matches!(
        &report.failures[..],
        [BuildError::MissingDependency { task, .. }] if task == "B"
    ));
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 0);

    let s = scenario();
    s.b.mark_force();
    let report = build(&fs, s.registry).await;
    assert!(matches!(
        &report.failures[..],
        [BuildError::MissingDependency { task, .. }] if task == "B"
    ));
    assert_eq!(s.b_runs.load(Ordering::SeqCst), 0);
    assert_eq!(s.a_runs.load(Ordering::SeqCst), 1);
}
