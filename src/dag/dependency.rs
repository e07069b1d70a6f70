// src/dag/dependency.rs

use std::path::{Path, PathBuf};

use crate::dag::TaskHandle;

/// Something a task depends on.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Ordering only: wait until the task has finished.
    Task(TaskHandle),
    /// Change detection: a file path relative to the build root.
    File(String),
    /// A declaration the engine cannot interpret (e.g. a malformed buildfile
    /// entry). Rejected when the owning task runs.
    Unsupported(String),
}

impl Dependency {
    pub fn as_task(&self) -> Option<&TaskHandle> {
        match self {
            Dependency::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&str> {
        match self {
            Dependency::File(path) => Some(path),
            _ => None,
        }
    }
}

impl From<TaskHandle> for Dependency {
    fn from(task: TaskHandle) -> Self {
        Dependency::Task(task)
    }
}

impl From<&TaskHandle> for Dependency {
    fn from(task: &TaskHandle) -> Self {
        Dependency::Task(task.clone())
    }
}

impl From<&str> for Dependency {
    fn from(path: &str) -> Self {
        Dependency::File(path.to_string())
    }
}

impl From<String> for Dependency {
    fn from(path: String) -> Self {
        Dependency::File(path)
    }
}

impl From<&Path> for Dependency {
    fn from(path: &Path) -> Self {
        Dependency::File(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Dependency {
    fn from(path: PathBuf) -> Self {
        Dependency::from(path.as_path())
    }
}
