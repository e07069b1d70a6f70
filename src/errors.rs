// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every task-scoped variant carries the name of the task it originated in,
//! so the orchestrator can attribute a failure without inspecting anything
//! else.

use thiserror::Error;

use crate::dag::TaskName;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("task '{task}': file dependency '{path}' does not exist")]
    MissingDependency { task: TaskName, path: String },

    #[error("task '{task}': invalid dependency type: {found}")]
    InvalidDependencyType { task: TaskName, found: String },

    #[error("task '{task}': command '{command}' exited with code {code}")]
    CommandFailed {
        task: TaskName,
        command: String,
        code: i32,
    },

    #[error("task '{task}' failed: {source:#}")]
    TaskFailed {
        task: TaskName,
        source: anyhow::Error,
    },

    #[error("task '{task}': failed to spawn '{command}': {source}")]
    Spawn {
        task: TaskName,
        command: String,
        source: std::io::Error,
    },

    #[error("task '{task}': failed waiting on '{command}': {source}")]
    Wait {
        task: TaskName,
        command: String,
        source: std::io::Error,
    },

    #[error("task '{task}': empty command")]
    EmptyCommand { task: TaskName },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("could not determine failed task: {0}")]
    Undetermined(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cache format error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    /// Name of the task this error is attributed to, if any.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            BuildError::MissingDependency { task, .. }
            | BuildError::InvalidDependencyType { task, .. }
            | BuildError::CommandFailed { task, .. }
            | BuildError::TaskFailed { task, .. }
            | BuildError::Spawn { task, .. }
            | BuildError::Wait { task, .. }
            | BuildError::EmptyCommand { task } => Some(task),
            _ => None,
        }
    }

    /// Attribute an error returned by `task`'s body.
    ///
    /// Errors the body propagated from its own [`TaskContext`] helpers are
    /// already attributed to `task` and pass through unchanged. Anything else
    /// becomes [`BuildError::TaskFailed`].
    ///
    /// [`TaskContext`]: crate::exec::TaskContext
    pub fn from_task_body(task: &str, source: anyhow::Error) -> Self {
        match source.downcast::<BuildError>() {
            Ok(err) if err.task_name() == Some(task) => err,
            Ok(err) => BuildError::TaskFailed {
                task: task.to_string(),
                source: err.into(),
            },
            Err(source) => BuildError::TaskFailed {
                task: task.to_string(),
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
