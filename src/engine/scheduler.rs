// src/engine/scheduler.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::dag::TaskHandle;
use crate::engine::BuildEnv;
use crate::errors::{BuildError, Result};

/// Starts every task at once and waits for all of them.
///
/// Correctness comes from each task waiting on its own dependencies, so the
/// scheduler never needs to know the shape of the graph. A cyclic graph would
/// wait forever; the registry API cannot build one.
#[derive(Debug)]
pub struct Scheduler {
    env: Arc<BuildEnv>,
}

impl Scheduler {
    pub fn new(env: Arc<BuildEnv>) -> Self {
        Self { env }
    }

    /// Run all tasks to completion and return every failure, in task order.
    ///
    /// A failing task never cancels its siblings.
    pub async fn run_all(&self, tasks: &[TaskHandle]) -> Vec<BuildError> {
        let running: Vec<(String, JoinHandle<Result<()>>)> = tasks
            .iter()
            .map(|task| {
                debug!(task = %task.name(), "starting task");
                (task.name().to_string(), tokio::spawn(task.run(Arc::clone(&self.env))))
            })
            .collect();

        let mut failures = Vec::new();
        for (name, handle) in running {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => failures.push(err),
                Err(join_err) => {
                    debug!(task = %name, "task future did not complete");
                    failures.push(BuildError::Undetermined(format!("{join_err:?}")));
                }
            }
        }
        failures
    }
}
