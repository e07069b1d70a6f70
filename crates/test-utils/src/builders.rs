#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskforge::{Dependency, Registry, TaskHandle};

/// Shared log of task body events, in the order they happened.
///
/// Each body records `"start:<name>"` when it begins and `"end:<name>"` when
/// it returns.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// How many times the body of `task` started.
    pub fn starts(&self, task: &str) -> usize {
        let start = format!("start:{task}");
        self.events().iter().filter(|e| **e == start).count()
    }
}

/// Builder for registries whose bodies record into an [`EventLog`].
pub struct RegistryBuilder {
    registry: Registry,
    log: EventLog,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            log: EventLog::new(),
        }
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    /// A task whose body records start/end and then returns `Ok`.
    pub fn task(&mut self, name: &str, deps: Vec<Dependency>) -> TaskHandle {
        self.slow_task(name, deps, Duration::ZERO)
    }

    /// Like [`task`](Self::task), but the body sleeps before finishing.
    pub fn slow_task(&mut self, name: &str, deps: Vec<Dependency>, delay: Duration) -> TaskHandle {
        let log = self.log.clone();
        let task = name.to_string();
        self.registry.task(name, deps, move |_ctx| {
            let log = log.clone();
            let task = task.clone();
            async move {
                log.push(format!("start:{task}"));
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                log.push(format!("end:{task}"));
                anyhow::Ok(())
            }
        })
    }

    /// A task whose body records its start and then fails with `message`.
    pub fn failing_task(&mut self, name: &str, deps: Vec<Dependency>, message: &str) -> TaskHandle {
        let log = self.log.clone();
        let task = name.to_string();
        let message = message.to_string();
        self.registry.task(name, deps, move |_ctx| {
            let log = log.clone();
            let task = task.clone();
            let message = message.clone();
            async move {
                log.push(format!("start:{task}"));
                Err::<(), _>(anyhow::anyhow!(message))
            }
        })
    }

    pub fn build(self) -> (Registry, EventLog) {
        (self.registry, self.log)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Register a task that only counts how often its body ran.
pub fn counting_task(registry: &mut Registry, name: &str, deps: Vec<Dependency>) -> (TaskHandle, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let handle = registry.task(name, deps, move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::Ok(())
        }
    });
    (handle, runs)
}
