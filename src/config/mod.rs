// src/config/mod.rs

//! Buildfile (`Taskforge.toml`) support for the `taskforge` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a buildfile from disk (`loader.rs`).
//! - Validate references and compute a registration order (`validate.rs`).
//! - Turn the validated buildfile into a task [`Registry`](crate::Registry)
//!   of command tasks (`tasks.rs`).

pub mod loader;
pub mod model;
pub mod tasks;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{CommandSpec, ConfigFile, ConfigSection, DepSpec, RawConfigFile, TaskConfig};
pub use tasks::build_registry;
