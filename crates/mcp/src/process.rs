use rivals_core::config::McpConfig;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::error::McpError;
use crate::types::{McpRequest, McpResponse};

const EOF_GRACE: Duration = Duration::from_millis(500);

/// How the child process ended once the exchange was over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Exited(ExitStatus),
    Killed,
}

/// A freshly spawned MCP process, scoped to a single request/response cycle.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle on any
/// path (including a cancelled future) still reaps the process. The explicit
/// [`shutdown`](Self::shutdown) and [`kill`](Self::kill) report how it ended.
pub struct McpProcessHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr: mpsc::UnboundedReceiver<String>,
    executable: String,
}

impl McpProcessHandle {
    #[instrument(skip_all, fields(executable = %config.executable))]
    pub async fn spawn(config: &McpConfig) -> Result<Self, McpError> {
        let mut command = Command::new(&config.executable);
        command.args(&config.args);
        command.envs(&config.env);
        command.kill_on_drop(true);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => McpError::ExecutableNotFound {
                executable: config.executable.clone(),
            },
            _ => McpError::Spawn {
                executable: config.executable.clone(),
                source: err,
            },
        })?;

        let stdin = child.stdin.take().ok_or(McpError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(McpError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(McpError::MissingPipe("stderr"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        debug!(pid = ?child.id(), "spawned MCP process");

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            stderr: rx,
            executable: config.executable.clone(),
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Write the request as one JSON line and flush it.
    pub async fn send(&mut self, request: &McpRequest) -> Result<(), McpError> {
        let payload = serde_json::to_string(request).map_err(McpError::Encode)?;
        let stdin = self.stdin.as_mut().ok_or(McpError::MissingPipe("stdin"))?;
        stdin.write_all(payload.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read exactly one line from stdout. `None` means the process closed
    /// stdout without answering.
    pub async fn read_line(&mut self) -> Result<Option<String>, McpError> {
        let mut buffer = String::new();
        let bytes = self.stdout.read_line(&mut buffer).await?;

        if bytes == 0 {
            debug!("MCP process exited or produced no output");
            return Ok(None);
        }

        Ok(Some(buffer.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Read one response line. A missing line becomes the error-tagged
    /// "no response" payload; a line that is not JSON is a decode error.
    pub async fn read_response(&mut self) -> Result<McpResponse, McpError> {
        match self.read_line().await? {
            None => Ok(McpResponse::no_response()),
            Some(line) => serde_json::from_str::<McpResponse>(&line)
                .map_err(|source| McpError::Decode { line, source }),
        }
    }

    /// Wait `delay`, then collect whatever the process wrote to stderr so far.
    pub async fn drain_stderr(&mut self, delay: Duration) -> Vec<String> {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut lines = Vec::new();
        while let Ok(line) = self.stderr.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Close stdin, ask the process to terminate, and give it `timeout` to
    /// exit before killing it.
    ///
    /// A stdio server normally exits on EOF, so SIGTERM is only sent once a
    /// short grace period has passed without the process exiting.
    pub async fn shutdown(mut self, timeout: Duration) -> ShutdownOutcome {
        drop(self.stdin.take());

        let grace = (timeout / 2).min(EOF_GRACE);
        if let Ok(Ok(status)) = tokio::time::timeout(grace, self.child.wait()).await {
            debug!(%status, "MCP process exited on EOF");
            return ShutdownOutcome::Exited(status);
        }

        self.request_termination();
        let remaining = timeout.saturating_sub(grace);
        match tokio::time::timeout(remaining, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "MCP process exited");
                ShutdownOutcome::Exited(status)
            }
            Ok(Err(err)) => {
                warn!(%err, executable = %self.executable, "failed to wait for MCP process; killing it");
                self.force_kill().await
            }
            Err(_) => {
                warn!(
                    executable = %self.executable,
                    timeout_ms = timeout.as_millis() as u64,
                    "MCP process did not exit in time; killing it"
                );
                self.force_kill().await
            }
        }
    }

    #[cfg(unix)]
    fn request_termination(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.id().and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => debug!(pid, "sent SIGTERM to MCP process"),
            Err(err) => debug!(pid, %err, "could not signal MCP process"),
        }
    }

    #[cfg(not(unix))]
    fn request_termination(&self) {}

    pub async fn kill(mut self) -> ShutdownOutcome {
        drop(self.stdin.take());
        self.force_kill().await
    }

    async fn force_kill(&mut self) -> ShutdownOutcome {
        if let Ok(Some(status)) = self.child.try_wait() {
            return ShutdownOutcome::Exited(status);
        }
        if let Err(err) = self.child.kill().await {
            warn!(%err, executable = %self.executable, "failed to kill MCP process");
        }
        ShutdownOutcome::Killed
    }
}
