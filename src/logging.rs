// src/logging.rs

//! Logging setup for `taskforge` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection, first match wins:
//! 1. `--log-level` CLI flag
//! 2. `TASKFORGE_LOG` environment variable, in `EnvFilter` syntax
//!    (e.g. "debug" or "taskforge::exec=trace,info")
//! 3. `RUST_LOG`
//! 4. `info`
//!
//! Logs are sent to STDERR so that stdout carries only task output.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "TASKFORGE_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(select_filter(cli_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

fn select_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(lvl) = cli_level {
        return EnvFilter::new(directive_for(lvl));
    }
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn directive_for(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_takes_precedence() {
        assert_eq!(select_filter(Some(LogLevel::Debug)).to_string(), "debug");
        assert_eq!(select_filter(Some(LogLevel::Error)).to_string(), "error");
    }

    #[test]
    fn every_cli_level_is_a_valid_directive() {
        for lvl in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug, LogLevel::Trace] {
            assert!(directive_for(lvl).parse::<tracing_subscriber::filter::Directive>().is_ok());
        }
    }
}
