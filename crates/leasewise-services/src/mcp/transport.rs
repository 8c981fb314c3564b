//! Child-process stdio transport.
//!
//! One JSON-RPC message per line over the child's stdin/stdout. The
//! session runs a single request at a time, so instead of an ID
//! multiplexing table a background reader pushes every parsed response
//! into a bounded queue; the caller drains anything stale before
//! writing and then waits for the response matching its ID. Stderr is
//! tailed into a ring buffer so diagnostics survive until the error
//! that needs them.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::error::{Result, ServiceError};

/// Queued responses the reader may buffer before the writer drains.
const RESPONSE_QUEUE_DEPTH: usize = 32;

/// Stderr lines retained for diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// How long to wait for the child to exit on its own during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Stdio transport to a spawned MCP server process.
#[derive(Debug)]
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    responses: mpsc::Receiver<JsonRpcResponse>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    next_id: u64,
}

/// Build the platform command. On Windows, npm shims like `npx` are
/// batch files and need the shell to resolve them.
fn build_command(program: &str, args: &[String]) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(program).args(args);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

impl StdioTransport {
    /// Spawn the server process and wire up both pipe readers.
    ///
    /// `env` entries are injected into the child's environment; the
    /// parent environment is otherwise inherited.
    pub fn spawn(program: &str, args: &[String], env: &[(String, String)]) -> Result<Self> {
        let mut cmd = build_command(program, args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ServiceError::Transport(format!("failed to spawn '{program}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ServiceError::Transport("failed to capture stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ServiceError::Transport("failed to capture stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ServiceError::Transport("failed to capture stderr".into()))?;

        let (tx, responses) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE_DEPTH);
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JsonRpcResponse>(trimmed) {
                    Ok(response) => {
                        if tx.send(response).await.is_err() {
                            break;
                        }
                    }
                    // Server-side notifications and log noise are
                    // expected on this stream; drop them.
                    Err(e) => debug!(error = %e, "stdio reader: ignoring non-response line"),
                }
            }
            debug!("stdio reader: stdout closed");
        });

        let stderr_tail: Arc<Mutex<VecDeque<String>>> =
            Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        let tail = Arc::clone(&stderr_tail);
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if let Ok(mut buf) = tail.lock() {
                    if buf.len() == STDERR_TAIL_LINES {
                        buf.pop_front();
                    }
                    buf.push_back(line);
                }
            }
        });

        Ok(Self {
            child,
            stdin,
            responses,
            stderr_tail,
            next_id: 0,
        })
    }

    /// Most recent stderr output, newline-joined.
    pub fn stderr_tail(&self) -> String {
        self.stderr_tail
            .lock()
            .map(|buf| buf.iter().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }

    /// Whether the child process is still running.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn transport_error(&self, what: &str) -> ServiceError {
        let tail = self.stderr_tail();
        if tail.is_empty() {
            ServiceError::Transport(what.to_string())
        } else {
            ServiceError::Transport(format!("{what}; server stderr:\n{tail}"))
        }
    }

    async fn write_line(&mut self, mut line: String) -> Result<()> {
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ServiceError::Transport(format!("failed to write to stdin: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ServiceError::Transport(format!("failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Send a request and wait up to `timeout` for its response.
    ///
    /// Stale responses left over from a previous timed-out request are
    /// drained before the new request is written, so they can never be
    /// mistaken for the current answer.
    pub async fn request(
        &mut self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<JsonRpcResponse> {
        while let Ok(stale) = self.responses.try_recv() {
            warn!(id = stale.id, "discarding stale queued response");
        }

        self.next_id += 1;
        let id = self.next_id;
        let request = JsonRpcRequest::new(id, method, params);
        debug!(method = %method, id, "sending request");
        self.write_line(serde_json::to_string(&request)?).await?;

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let response = tokio::time::timeout_at(deadline, self.responses.recv())
                .await
                .map_err(|_| {
                    self.transport_error(&format!(
                        "timed out after {}s waiting for response to '{method}'",
                        timeout.as_secs()
                    ))
                })?
                .ok_or_else(|| self.transport_error("server closed its stdout"))?;
            if response.id == id {
                return Ok(response);
            }
            warn!(
                got = response.id,
                expected = id,
                "discarding response for a different request"
            );
        }
    }

    /// Send a notification; nothing comes back.
    pub async fn notify(&mut self, method: &str, params: serde_json::Value) -> Result<()> {
        let note = JsonRpcNotification::new(method, params);
        debug!(method = %method, "sending notification");
        self.write_line(serde_json::to_string(&note)?).await
    }

    /// Close stdin and wait for the child to exit, escalating to kill
    /// after [`SHUTDOWN_TIMEOUT`].
    pub async fn shutdown(mut self) {
        drop(self.stdin);
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "server exited"),
            Ok(Err(e)) => warn!(error = %e, "error waiting for server exit"),
            Err(_) => {
                warn!("server did not exit in time; killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "failed to kill server");
                }
            }
        }
    }
}
