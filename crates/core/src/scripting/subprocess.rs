//! Child process lifecycle for script invocations.
//!
//! Provides [`run_command`], the spawn + I/O + timeout + cancellation logic
//! shared by every script kind. The caller builds a
//! [`tokio::process::Command`] for its interpreter and delegates here.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use super::executor::InvocationOutput;
use crate::error::InvokeError;

/// Default cap on stdout or stderr captured per stream (10 MiB).
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Hides the console window of the child on Windows.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

const READ_CHUNK_BYTES: usize = 8192;

/// Per-run process settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working directory for the child (inherits the current dir if `None`).
    pub working_directory: Option<PathBuf>,
    /// Variables overlaid on the inherited environment; these win on conflict.
    pub env_vars: Vec<(String, String)>,
    /// Wall-clock limit covering process exit and output draining.
    pub timeout: Option<Duration>,
    /// Bytes kept per stream; the rest is drained and counted.
    pub output_limit_bytes: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            working_directory: None,
            env_vars: Vec::new(),
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: usize,
}

enum Outcome {
    Finished(std::io::Result<(ExitStatus, Captured, Captured)>),
    TimedOut,
    Cancelled,
}

/// Spawn `cmd`, wait for it asynchronously while draining stdout and stderr
/// concurrently, and enforce the timeout and cancellation in `options`.
///
/// A non-zero exit is not an error here: the exit code is returned in the
/// [`InvocationOutput`] so the caller can still forward stdout. On timeout
/// or cancellation the whole process tree is killed before returning.
pub async fn run_command(
    cmd: &mut Command,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Result<InvocationOutput, InvokeError> {
    // `kill_on_drop(true)` releases the direct child; `TreeGuard` below
    // covers the rest of the group when the future is dropped mid-run.
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &options.env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = &options.working_directory {
        cmd.current_dir(dir);
    }

    // Own process group, so the whole tree can be signalled at once.
    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            tracing::error!(program = %program, error = %source, "Failed to launch interpreter");
            return Err(InvokeError::LaunchFailed { program, source });
        }
    };
    let pid = child.id();
    // Declared after `child` so it drops first and signals the group while
    // the leader still exists.
    let guard = TreeGuard::new(pid);
    tracing::debug!(program = %program, pid, "Child process started");

    // Input travels as an argument; stdin is closed so the child sees EOF.
    drop(child.stdin.take());
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let limit = options.output_limit_bytes;
    let deadline = options.timeout.map(|t| tokio::time::Instant::now() + t);

    let outcome = {
        let run = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                read_stream_limited(stdout, limit),
                read_stream_limited(stderr, limit),
            );
            Ok::<_, std::io::Error>((status?, stdout?, stderr?))
        };

        tokio::select! {
            result = until(deadline, run) => match result {
                Some(result) => Outcome::Finished(result),
                None => Outcome::TimedOut,
            },
            _ = cancel.cancelled() => Outcome::Cancelled,
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    guard.disarm();

    match outcome {
        Outcome::Finished(Ok((status, stdout, stderr))) => {
            let exit_code = status.code().unwrap_or(-1);
            if stdout.truncated > 0 || stderr.truncated > 0 {
                tracing::warn!(
                    stdout_truncated = stdout.truncated,
                    stderr_truncated = stderr.truncated,
                    limit,
                    "Script output truncated",
                );
            }
            tracing::debug!(pid, exit_code, duration_ms, "Child process exited");

            Ok(InvocationOutput {
                stdout: String::from_utf8_lossy(&stdout.bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr.bytes).into_owned(),
                stdout_bytes: stdout.bytes,
                exit_code,
                duration_ms,
                stdout_truncated: stdout.truncated,
                stderr_truncated: stderr.truncated,
            })
        }
        Outcome::Finished(Err(e)) => {
            tracing::error!(pid, error = %e, "Lost contact with child process");
            terminate_tree(&mut child, pid).await;
            Err(InvokeError::Io(e))
        }
        Outcome::TimedOut => {
            let timeout_ms = options.timeout.map_or(0, |t| t.as_millis() as u64);
            tracing::warn!(pid, timeout_ms, "Script timed out, killing process tree");
            terminate_tree(&mut child, pid).await;
            Err(InvokeError::Timeout { timeout_ms })
        }
        Outcome::Cancelled => {
            tracing::warn!(pid, duration_ms, "Script cancelled, killing process tree");
            terminate_tree(&mut child, pid).await;
            Err(InvokeError::Cancelled)
        }
    }
}

/// Await `fut`, giving up at `deadline` if one is set.
async fn until<F: Future>(deadline: Option<tokio::time::Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes.
///
/// Bytes past the limit are still read so the child never blocks on a
/// full pipe.
async fn read_stream_limited<R: AsyncRead + Unpin>(
    stream: Option<R>,
    limit: usize,
) -> std::io::Result<Captured> {
    let mut captured = Captured::default();
    let Some(mut stream) = stream else {
        return Ok(captured);
    };

    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(captured.bytes.len()));
        captured.bytes.extend_from_slice(&chunk[..keep]);
        captured.truncated += n - keep;
    }

    Ok(captured)
}

/// Kills the child's process tree on drop unless disarmed.
///
/// Runs when the `run_command` future is dropped before the child is done,
/// e.g. by an outer `tokio::time::timeout` or a losing `select!` branch.
struct TreeGuard {
    pid: Option<u32>,
}

impl TreeGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(mut self) {
        self.pid = None;
    }
}

impl Drop for TreeGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            tracing::debug!(pid, "Invocation dropped, killing process tree");
            kill_tree_sync(pid);
        }
    }
}

/// Kill the child and everything it spawned, then reap the child.
async fn terminate_tree(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_tree(pid).await;
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "Child already reaped");
    }
}

#[cfg(unix)]
async fn kill_tree(pid: u32) {
    kill_tree_sync(pid);
}

/// Signal the whole tree from synchronous code such as `Drop`.
#[cfg(unix)]
fn kill_tree_sync(pid: u32) {
    // Safety: killpg only sends a signal. The child was spawned with
    // `process_group(0)`, so its pid is also its process group id.
    let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if ret != 0 {
        tracing::debug!(
            pid,
            error = %std::io::Error::last_os_error(),
            "killpg failed (group already gone?)",
        );
    }
}

#[cfg(windows)]
async fn kill_tree(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(CREATE_NO_WINDOW)
        .status()
        .await;
    if let Err(e) = result {
        tracing::warn!(pid, error = %e, "taskkill failed");
    }
}

/// Run `taskkill` from synchronous code such as `Drop`.
///
/// Waits for it to finish: `/T` walks the tree from the leader, which
/// `kill_on_drop` removes right after the guard.
#[cfg(windows)]
fn kill_tree_sync(pid: u32) {
    use std::os::windows::process::CommandExt;

    let result = std::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(CREATE_NO_WINDOW)
        .status();
    if let Err(e) = result {
        tracing::warn!(pid, error = %e, "taskkill failed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
