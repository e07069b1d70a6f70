// src/dag/registry.rs

use std::future::Future;

use crate::dag::{BoxFuture, Dependency, TaskHandle, TaskName};
use crate::exec::TaskContext;

/// Ordered collection of every task declared for one build.
///
/// Built explicitly by the build setup and handed to the orchestrator. There
/// is no de-duplication: registering the same name twice yields two tasks.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: Vec<TaskHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a task and return its handle for use as a dependency.
    ///
    /// Dependencies must already exist when a task is declared, which is why
    /// the task graph built through this API can never contain a cycle.
    pub fn task<F, Fut>(&mut self, name: impl Into<TaskName>, deps: Vec<Dependency>, body: F) -> TaskHandle
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handle = TaskHandle::new(
            name.into(),
            deps,
            Box::new(move |ctx| -> BoxFuture<anyhow::Result<()>> { Box::pin(body(ctx)) }),
        );
        self.tasks.push(handle.clone());
        handle
    }

    pub fn tasks(&self) -> &[TaskHandle] {
        &self.tasks
    }

    pub fn get(&self, name: &str) -> Option<&TaskHandle> {
        self.tasks.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
