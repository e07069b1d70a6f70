// src/exec/mod.rs

//! Process execution on behalf of running tasks.
//!
//! - [`context`] defines [`TaskContext`], the explicit execution context every
//!   task body receives. It carries the task identity used to prefix output.
//! - [`command`] spawns a process, streams its stdout/stderr line by line with
//!   the task name prefixed, and turns a non-zero exit into an error when
//!   running in strict mode.

pub mod command;
pub mod context;

pub use command::{display_command, run_command};
pub use context::TaskContext;
