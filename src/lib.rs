// src/lib.rs

//! `taskforge`: a small declarative build-task orchestrator.
//!
//! Build code registers named tasks with dependencies on other tasks or on
//! files, then hands the [`Registry`] to the [`Orchestrator`]. Every task is
//! started at once and waits on its own dependencies; a task whose file
//! dependencies all kept their modification time since the last successful
//! build is skipped.
//!
//! ```no_run
//! use taskforge::{deps, BuildOptions, Orchestrator, Registry};
//!
//! # async fn build() -> anyhow::Result<()> {
//! let mut registry = Registry::new();
//! let codegen = registry.task("gen", deps![], |ctx| async move {
//!     ctx.run(["python3", "gen.py"]).await?;
//!     anyhow::Ok(())
//! });
//! registry.task("compile", deps![&codegen, "gen.c"], |ctx| async move {
//!     ctx.run(["cc", "-c", "gen.c"]).await?;
//!     anyhow::Ok(())
//! });
//!
//! let report = Orchestrator::new(registry, BuildOptions::default()).run().await?;
//! std::process::exit(report.exit_code());
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{ConfigFile, build_registry, load_and_validate};
use crate::errors::Result;

pub use crate::dag::{Dependency, Registry, TaskHandle, TaskState};
pub use crate::engine::{BuildOptions, BuildReport, Orchestrator};
pub use crate::errors::BuildError;
pub use crate::exec::TaskContext;
pub use tokio::task::yield_now;

/// Entry point used by `main.rs`: build the tasks declared in the buildfile.
pub async fn run(args: CliArgs) -> Result<BuildReport> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let registry = build_registry(&cfg)?;

    if args.dry_run {
        print_dry_run(&registry);
        return Ok(BuildReport::default());
    }

    let mut options = BuildOptions::new(config_root_dir(&config_path)).force_all(args.build_anyway);
    if let Some(cache_file) = &cfg.config.cache_file {
        options = options.cache_file(cache_file);
    }
    log_config(&cfg);

    Orchestrator::new(registry, options).run().await
}

/// Entry point for build programs that declare their tasks in Rust.
///
/// Uses the current directory as the build root and honours
/// `--build-anyway`. Logging must already be initialised.
pub async fn run_registry(args: &CliArgs, registry: Registry) -> Result<BuildReport> {
    let options = BuildOptions::default().force_all(args.build_anyway);
    Orchestrator::new(registry, options).run().await
}

/// Build root for a buildfile path.
///
/// - If the path has a non-empty parent (e.g. "sub/Taskforge.toml"), that
///   directory is the root.
/// - A bare file name means the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::new(),
    }
}

fn log_config(cfg: &ConfigFile) {
    debug!(
        tasks = cfg.task.len(),
        order = ?cfg.registration_order(),
        cache_file = ?cfg.config.cache_file,
        "loaded buildfile"
    );
}

/// Simple dry-run output: print tasks and their dependencies.
fn print_dry_run(registry: &Registry) {
    println!("taskforge dry-run");
    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        println!("  - {}", task.name());
        if task.is_forced() {
            println!("      force: true");
        }
        for dep in task.dependencies() {
            match dep {
                Dependency::Task(t) => println!("      after task: {}", t.name()),
                Dependency::File(path) => println!("      file: {path}"),
                Dependency::Unsupported(found) => println!("      unsupported: {found}"),
            }
        }
    }
}
