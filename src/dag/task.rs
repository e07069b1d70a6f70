// src/dag/task.rs

//! Per-task state machine.
//!
//! ```text
//! NotStarted -> Skipped | Succeeded | Failed
//! ```
//!
//! Any terminal state unblocks dependents, including `Failed`: a dependent
//! still attempts its own body when one of its dependencies failed. The build
//! as a whole fails afterwards through the orchestrator.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use crate::cache::Timestamp;
use crate::dag::{Dependency, TaskName};
use crate::engine::BuildEnv;
use crate::errors::{BuildError, Result};
use crate::exec::TaskContext;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub(crate) type TaskBody = Box<dyn Fn(TaskContext) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// Completion state of a task within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    NotStarted,
    /// Every file dependency was unchanged; the body did not run.
    Skipped,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        !matches!(self, TaskState::NotStarted)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::NotStarted => "not started",
            TaskState::Skipped => "skipped (unchanged)",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

struct TaskNode {
    name: TaskName,
    deps: Vec<Dependency>,
    body: TaskBody,
    force: AtomicBool,
    state: watch::Sender<TaskState>,
    /// Serialises the initial run and any forced re-run triggered by dependents.
    run_lock: Mutex<()>,
}

/// Shared handle to a registered task.
///
/// Cheap to clone; clones refer to the same task.
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskNode>);

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.0.name)
            .field("deps", &self.0.deps.len())
            .field("force", &self.is_forced())
            .field("state", &self.state())
            .finish()
    }
}

impl TaskHandle {
    pub(crate) fn new(name: TaskName, deps: Vec<Dependency>, body: TaskBody) -> Self {
        let (state, _) = watch::channel(TaskState::NotStarted);
        Self(Arc::new(TaskNode {
            name,
            deps,
            body,
            force: AtomicBool::new(false),
            state,
            run_lock: Mutex::new(()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.0.deps
    }

    pub fn state(&self) -> TaskState {
        *self.0.state.borrow()
    }

    pub fn is_forced(&self) -> bool {
        self.0.force.load(Ordering::SeqCst)
    }

    /// Force this task's body to run regardless of the change cache.
    ///
    /// Returns the handle itself so it can be used inline as a dependency:
    /// `deps![codegen.mark_force(), "in.txt"]`. Marking a task that was already
    /// skipped makes the next dependent that reaches it re-run it.
    pub fn mark_force(&self) -> TaskHandle {
        self.0.force.store(true, Ordering::SeqCst);
        self.clone()
    }

    /// Wait until this task reaches a terminal state.
    pub async fn wait_finished(&self) -> TaskState {
        let mut rx = self.0.state.subscribe();
        let finished = rx.wait_for(|s| s.is_finished()).await.map(|s| *s);
        // The sender lives as long as this handle, so the channel cannot close.
        finished.unwrap_or_else(|_| self.state())
    }

    fn task_deps(&self) -> impl Iterator<Item = &TaskHandle> {
        self.0.deps.iter().filter_map(Dependency::as_task)
    }

    /// Run this task within the given build.
    ///
    /// The body runs at most once per build: a call on a task that already
    /// ran its body (or is skipped and not force-marked) returns immediately.
    pub fn run(&self, env: Arc<BuildEnv>) -> BoxFuture<Result<()>> {
        let this = self.clone();
        Box::pin(async move { this.run_locked(env).await })
    }

    async fn run_locked(&self, env: Arc<BuildEnv>) -> Result<()> {
        let _running = self.0.run_lock.lock().await;

        match self.state() {
            TaskState::NotStarted => {}
            TaskState::Skipped if self.is_forced() => {
                debug!(task = %self.name(), "re-running skipped task after force mark");
            }
            _ => return Ok(()),
        }

        let guard = CompletionGuard::new(&self.0);
        // Clears a previous skip before re-running.
        self.0.state.send_replace(TaskState::NotStarted);

        match self.execute(&env).await {
            Ok(state) => {
                guard.finish(state);
                Ok(())
            }
            Err(err) => {
                guard.finish(TaskState::Failed);
                Err(err)
            }
        }
    }

    async fn execute(&self, env: &Arc<BuildEnv>) -> Result<TaskState> {
        let file_deps = self.probe_dependencies(env)?;

        let unchanged = {
            let cache = env.cache();
            file_deps.iter().all(|(path, current)| cache.is_unchanged(path, *current))
        };
        if !file_deps.is_empty() && unchanged && !env.force_all() && !self.is_forced() {
            info!(task = %self.name(), "skipped task '{}': files unchanged since last build", self.name());
            return Ok(TaskState::Skipped);
        }

        for dep in self.task_deps() {
            if dep.is_forced() && dep.state() == TaskState::Skipped {
                info!(task = %self.name(), dependency = %dep.name(), "re-running forced dependency");
                dep.run(Arc::clone(env)).await?;
            }
        }

        for dep in self.task_deps() {
            let state = dep.wait_finished().await;
            debug!(task = %self.name(), dependency = %dep.name(), %state, "dependency finished");
        }

        let ctx = TaskContext::new(self.name(), env.root());
        (self.0.body)(ctx)
            .await
            .map_err(|source| BuildError::from_task_body(self.name(), source))?;

        for (path, _) in &file_deps {
            let current = env
                .modified(path)
                .map_err(|source| BuildError::TaskFailed {
                    task: self.name().to_string(),
                    source,
                })?;
            env.cache().record(path.as_str(), current);
        }

        info!(task = %self.name(), "task '{}' succeeded", self.name());
        Ok(TaskState::Succeeded)
    }

    /// Validate every dependency and read the current timestamp of each file
    /// dependency. Runs before any suspension point.
    fn probe_dependencies(&self, env: &BuildEnv) -> Result<Vec<(String, Timestamp)>> {
        let mut file_deps = Vec::new();
        for dep in &self.0.deps {
            match dep {
                Dependency::Task(_) => {}
                Dependency::File(path) => {
                    if !env.exists(path) {
                        return Err(BuildError::MissingDependency {
                            task: self.name().to_string(),
                            path: path.clone(),
                        });
                    }
                    let current = env.modified(path).map_err(|source| BuildError::TaskFailed {
                        task: self.name().to_string(),
                        source,
                    })?;
                    file_deps.push((path.clone(), current));
                }
                Dependency::Unsupported(found) => {
                    return Err(BuildError::InvalidDependencyType {
                        task: self.name().to_string(),
                        found: found.clone(),
                    });
                }
            }
        }
        Ok(file_deps)
    }
}

/// Publishes `Failed` if a run is dropped (or its body panics) before it
/// reached a terminal state, so dependents never wait forever.
struct CompletionGuard<'a> {
    node: &'a TaskNode,
    done: bool,
}

impl<'a> CompletionGuard<'a> {
    fn new(node: &'a TaskNode) -> Self {
        Self { node, done: false }
    }

    fn finish(mut self, state: TaskState) {
        self.node.state.send_replace(state);
        self.done = true;
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.node.state.send_replace(TaskState::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_started_is_unfinished() {
        assert!(!TaskState::NotStarted.is_finished());
        assert!(TaskState::Skipped.is_finished());
        assert!(TaskState::Succeeded.is_finished());
        assert!(TaskState::Failed.is_finished());
    }

    #[test]
    fn mark_force_returns_same_task() {
        let body: TaskBody = Box::new(|_ctx| -> BoxFuture<anyhow::Result<()>> { Box::pin(async { anyhow::Ok(()) }) });
        let handle = TaskHandle::new("gen".into(), vec![], body);
        assert!(!handle.is_forced());
        let forced = handle.mark_force();
        assert!(handle.is_forced());
        assert!(Arc::ptr_eq(&handle.0, &forced.0));
    }
}
