// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskforge`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskforge",
    version,
    about = "Run declared build tasks, skipping those whose input files are unchanged.",
    long_about = None
)]
pub struct CliArgs {
    /// Run every task regardless of file checks.
    #[arg(short = 'B', long)]
    pub build_anyway: bool,

    /// Path to the buildfile (TOML).
    ///
    /// Its directory is the build root: file dependencies are resolved
    /// against it and commands run inside it.
    #[arg(long, value_name = "PATH", default_value = "Taskforge.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKFORGE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and print the task graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
