// src/engine/report.rs

use tracing::error;

use crate::dag::{TaskName, TaskState};
use crate::errors::BuildError;

/// Final state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub name: TaskName,
    pub state: TaskState,
}

/// Outcome of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub tasks: Vec<TaskSummary>,
    pub failures: Vec<BuildError>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit code for this build: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks.iter().find(|t| t.name == task).map(|t| t.state)
    }

    /// Names of the tasks failures are attributed to, in report order.
    pub fn failed_tasks(&self) -> Vec<&str> {
        self.failures.iter().filter_map(BuildError::task_name).collect()
    }

    pub(crate) fn log_failures(&self) {
        for failure in &self.failures {
            match failure.task_name() {
                Some(task) => {
                    error!(task = %task, error = %failure, "build failed on task '{}'", task);
                }
                None => {
                    error!(error = ?failure, "could not determine failed task");
                }
            }
        }
        error!(failures = self.failures.len(), "build failed, exit code {}", self.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_follows_failures() {
        let mut report = BuildReport::default();
        assert_eq!(report.exit_code(), 0);

        report.failures.push(BuildError::CommandFailed {
            task: "link".into(),
            command: "ld".into(),
            code: 1,
        });
        report.failures.push(BuildError::Undetermined("panicked".into()));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed_tasks(), vec!["link"]);
    }
}
