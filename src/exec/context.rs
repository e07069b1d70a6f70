// src/exec/context.rs

use std::ffi::{OsStr, OsString};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::dag::TaskName;
use crate::errors::Result;
use crate::exec::command::run_command;

/// Execution context handed to a task body.
///
/// Commands started through it are attributed to the owning task: their
/// output is prefixed with the task name and failures carry it too.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task: TaskName,
    root: PathBuf,
}

impl TaskContext {
    pub fn new(task: impl Into<TaskName>, root: impl Into<PathBuf>) -> Self {
        Self {
            task: task.into(),
            root: root.into(),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    /// Build root; commands run with it as their working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a command and fail with `CommandFailed` on a non-zero exit.
    ///
    /// Returns the exit code (always 0 on success).
    pub async fn run<I, S>(&self, command: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        run_command(&self.task, &self.root, collect_argv(command), true).await
    }

    /// Run a command and return its exit code, whatever it is.
    pub async fn run_unchecked<I, S>(&self, command: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        run_command(&self.task, &self.root, collect_argv(command), false).await
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    pub fn log(&self, message: impl Display) {
        info!(task = %self.task, "{}: {}", self.task, message);
    }
}

fn collect_argv<I, S>(command: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    command.into_iter().map(|s| s.as_ref().to_os_string()).collect()
}
