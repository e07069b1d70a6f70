// src/dag/mod.rs

//! Task graph: tasks, their dependencies, and the registry that owns them.
//!
//! - [`dependency`] defines what a task can depend on (another task or a file).
//! - [`task`] holds the per-task state machine and the `run()` contract.
//! - [`registry`] collects every task declared while setting up a build.
//!
//! There is no central planner: every task waits on its own dependencies, so
//! the orchestrator can simply start all of them at once.

pub mod dependency;
pub mod registry;
pub mod task;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

pub use dependency::Dependency;
pub use registry::Registry;
pub use task::{BoxFuture, TaskHandle, TaskState};

/// Build a `Vec<Dependency>` from task handles and file paths.
///
/// ```
/// use taskforge::{deps, Registry};
///
/// let mut registry = Registry::new();
/// let codegen = registry.task("gen", deps![], |_ctx| async { anyhow::Ok(()) });
/// let deps = deps![&codegen, "in.txt"];
/// assert_eq!(deps.len(), 2);
/// ```
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        vec![$($crate::dag::Dependency::from($dep)),*]
    };
}
