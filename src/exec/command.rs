// src/exec/command.rs

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::{BuildError, Result};

/// Run `argv` for `task`, streaming its output prefixed with the task name.
///
/// - stdout and stderr are drained concurrently, one line at a time; a final
///   line without a trailing newline is still printed.
/// - With `check` set, a non-zero exit becomes [`BuildError::CommandFailed`].
/// - A process killed by a signal reports exit code `-1`.
pub async fn run_command(task: &str, root: &Path, argv: Vec<OsString>, check: bool) -> Result<i32> {
    let Some((program, args)) = argv.split_first() else {
        return Err(BuildError::EmptyCommand {
            task: task.to_string(),
        });
    };
    let command_line = display_command(&argv);
    info!(task = %task, "{}: {}", task, command_line);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if !root.as_os_str().is_empty() {
        cmd.current_dir(root);
    }

    let mut child = cmd.spawn().map_err(|source| BuildError::Spawn {
        task: task.to_string(),
        command: command_line.clone(),
        source,
    })?;

    let pumps: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| spawn_pump(task, out)),
        child.stderr.take().map(|err| spawn_pump(task, err)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = child.wait().await.map_err(|source| BuildError::Wait {
        task: task.to_string(),
        command: command_line.clone(),
        source,
    })?;
    for pump in pumps {
        // Output is best-effort; a reader that panicked only loses lines.
        let _ = pump.await;
    }

    let code = status.code().unwrap_or(-1);
    debug!(task = %task, exit_code = code, success = status.success(), "command exited");

    if check && code != 0 {
        return Err(BuildError::CommandFailed {
            task: task.to_string(),
            command: command_line,
            code,
        });
    }
    Ok(code)
}

fn spawn_pump<R>(task: &str, stream: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let task = task.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => println!("{}", prefixed_line(&task, &buf)),
                Err(e) => {
                    debug!(task = %task, error = %e, "stopped reading command output");
                    break;
                }
            }
        }
    })
}

/// Format one raw output line as `<task>: <line>`, without the line ending.
pub(crate) fn prefixed_line(task: &str, raw: &[u8]) -> String {
    let line = String::from_utf8_lossy(raw);
    let line = line.strip_suffix('\n').unwrap_or(&line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    format!("{task}: {line}")
}

/// Render an argv as a single space-separated command line.
pub fn display_command(argv: &[OsString]) -> String {
    argv.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
