//! External process execution.
//!
//! [`ProcessExecutor`] runs one command vector in a working directory with a
//! timeout. The program is spawned directly (no shell), stdout and stderr are
//! merged line by line into one captured stream, and every failure mode is
//! folded into a [`CommandOutcome`] with exit code `-1` instead of an error.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::toolchain::{Passthrough, ToolchainResolver};

/// Exit code reported when the process did not exit on its own.
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// How long to keep draining pipes once the child is gone. Background
/// grandchildren may still hold the pipes open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Merged stdout and stderr. Executor-level failures append their
    /// message on a final line.
    pub output: String,
    /// Process exit code, or [`EXIT_CODE_UNAVAILABLE`].
    pub exit_code: i32,
    /// Wall time from spawn to exit, kill or failure.
    pub duration: Duration,
    /// Why the process could not run to completion, if it couldn't.
    pub error: Option<String>,
}

impl CommandOutcome {
    fn exited(output: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            success: exit_code == 0,
            output,
            exit_code,
            duration,
            error: None,
        }
    }

    fn failed(mut output: String, message: String, duration: Duration) -> Self {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&message);
        Self {
            success: false,
            output,
            exit_code: EXIT_CODE_UNAVAILABLE,
            duration,
            error: Some(message),
        }
    }
}

/// Spawns commands after passing them through a [`ToolchainResolver`].
#[derive(Clone)]
pub struct ProcessExecutor {
    resolver: Arc<dyn ToolchainResolver>,
}

impl std::fmt::Debug for ProcessExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessExecutor").finish_non_exhaustive()
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Arc::new(Passthrough))
    }
}

impl ProcessExecutor {
    pub fn new(resolver: Arc<dyn ToolchainResolver>) -> Self {
        Self { resolver }
    }

    /// Run `command` in `cwd`, killing it once `limit` elapses.
    pub async fn execute(&self, command: &[String], cwd: &Path, limit: Duration) -> CommandOutcome {
        let Some(resolved) = self.resolver.resolve(command) else {
            let message = "command is empty".to_string();
            error!("{}", message);
            return CommandOutcome::failed(String::new(), message, Duration::ZERO);
        };

        let shown = resolved.display();
        let workdir = cwd.display();
        info!(command = %shown, cwd = %workdir, "Executing command");

        if !cwd.is_dir() {
            let message = format!("working directory does not exist: {}", cwd.display());
            error!("{}", message);
            return CommandOutcome::failed(String::new(), message, Duration::ZERO);
        }

        let mut cmd = Command::new(&resolved.program);
        cmd.args(&resolved.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        resolved.environment.apply(&mut cmd);

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = format!("failed to execute '{}': {}", resolved.program, e);
                error!("{}", message);
                return CommandOutcome::failed(String::new(), message, started.elapsed());
            }
        };

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, buffer.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, buffer.clone()));
        }

        let outcome = match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let duration = started.elapsed();
                drain(pumps).await;
                let output = take_output(&buffer).await;
                CommandOutcome::exited(
                    output,
                    status.code().unwrap_or(EXIT_CODE_UNAVAILABLE),
                    duration,
                )
            }
            Ok(Err(e)) => {
                drain(pumps).await;
                let message = format!("failed to wait for '{}': {}", resolved.program, e);
                CommandOutcome::failed(take_output(&buffer).await, message, started.elapsed())
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Failed to kill timed out process");
                }
                let duration = started.elapsed();
                drain(pumps).await;
                let message = format!(
                    "command timed out (exceeded {} seconds)",
                    limit.as_secs_f64()
                );
                CommandOutcome::failed(take_output(&buffer).await, message, duration)
            }
        };

        let secs = format!("{:.2}s", outcome.duration.as_secs_f64());
        if outcome.success {
            info!(duration = %secs, "Command succeeded");
            debug!("Command output:\n{}", outcome.output);
        } else {
            error!(
                exit_code = outcome.exit_code,
                duration = %secs,
                "Command failed"
            );
            error!("Command output:\n{}", outcome.output);
        }
        outcome
    }
}

/// Copy lines from a pipe into the shared buffer until EOF.
fn spawn_pump<R>(reader: R, buffer: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => buffer.lock().await.extend_from_slice(&line),
            }
        }
    })
}

/// Give the pumps one shared grace period, then abandon them.
async fn drain(pumps: Vec<JoinHandle<()>>) {
    let aborts: Vec<_> = pumps.iter().map(JoinHandle::abort_handle).collect();
    if timeout(DRAIN_GRACE, join_all(pumps)).await.is_err() {
        for abort in aborts {
            abort.abort();
        }
    }
}

async fn take_output(buffer: &Mutex<Vec<u8>>) -> String {
    let bytes = std::mem::take(&mut *buffer.lock().await);
    String::from_utf8_lossy(&bytes).into_owned()
}
