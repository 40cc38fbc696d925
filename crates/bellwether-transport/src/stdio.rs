//! # Stdio Transport
//!
//! Launches the target server as a subprocess and speaks newline-delimited
//! JSON-RPC over its stdin/stdout. A background reader task routes response
//! frames to waiting callers by request id; stderr is forwarded through
//! `tracing` at warn level so server noise lands in the operator's log
//! rather than corrupting the protocol stream.
//!
//! Concurrency: callers share the session freely. The only lock held across
//! a suspension point is the stdin writer; the id-routing map uses a plain
//! mutex with no `await` inside the critical section. A call that times out
//! abandons its id, and any late response for an abandoned id is discarded.

use crate::error::{Result, TransportError};
use crate::frame::{JsonRpcRequest, JsonRpcResponse};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tracing::{debug, warn};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// How to launch the target process.
#[derive(Debug, Clone)]
pub struct StdioConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,

    /// Wait this long after spawning before the first call; a process that
    /// exits inside the window is reported as a startup failure.
    pub startup_grace: Duration,
}

impl StdioConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: Vec::new(),
            startup_grace: Duration::from_millis(300),
        }
    }

    /// The command line as one display string.
    pub fn display_command(&self) -> String {
        let mut out = self.command.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// A JSON-RPC session over a spawned subprocess.
pub struct StdioSession {
    stdin: tokio::sync::Mutex<ChildStdin>,
    child: tokio::sync::Mutex<Child>,
    pending: PendingMap,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    reader: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StdioSession {
    /// Spawns the target and establishes the session.
    pub async fn connect(config: StdioConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::Startup(format!("{}: {e}", config.command)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Protocol("stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Protocol("stdout unavailable".into()))?;

        // Forward stderr through tracing.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.trim().is_empty() {
                        warn!(target: "bellwether_transport::server_stderr", "{line}");
                    }
                }
            });
        }

        // Startup grace: give the process a moment, then make sure it is
        // still alive before the caller's first request.
        tokio::time::sleep(config.startup_grace).await;
        if let Some(status) = child
            .try_wait()
            .map_err(|e| TransportError::Startup(e.to_string()))?
        {
            return Err(TransportError::Startup(format!(
                "process exited with {status} before becoming ready"
            )));
        }

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader_pending = Arc::clone(&pending);
        let reader_closed = Arc::clone(&closed);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        route_frame(trimmed, &reader_pending);
                    }
                    Ok(None) | Err(_) => break,
                }
            }
            // EOF or read failure: fail everything still waiting.
            reader_closed.store(true, Ordering::SeqCst);
            let waiters: Vec<_> = {
                let mut map = reader_pending.lock().expect("pending map poisoned");
                map.drain().collect()
            };
            for (_, tx) in waiters {
                let _ = tx.send(Err(TransportError::Closed));
            }
        });

        Ok(Self {
            stdin: tokio::sync::Mutex::new(stdin),
            child: tokio::sync::Mutex::new(child),
            pending,
            next_id: AtomicU64::new(1),
            closed,
            reader: Mutex::new(Some(reader)),
        })
    }

    async fn write_frame(&self, request: &JsonRpcRequest) -> Result<()> {
        let frame = request
            .to_frame()
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(frame.as_bytes()).await.map_err(|_| TransportError::Closed)?;
        stdin.flush().await.map_err(|_| TransportError::Closed)?;
        Ok(())
    }
}

/// Parses one stdout line and routes it to its waiter, if any.
fn route_frame(line: &str, pending: &PendingMap) {
    let response: JsonRpcResponse = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(_) => {
            // Servers sometimes print banners or their own requests; those
            // are not responses to us and are ignored.
            debug!("ignoring non-response frame");
            return;
        }
    };

    let id = match response.numeric_id() {
        Some(id) => id,
        None => return,
    };

    let waiter = {
        let mut map = pending.lock().expect("pending map poisoned");
        map.remove(&id)
    };
    let waiter = match waiter {
        Some(w) => w,
        None => {
            debug!(id, "discarding response for abandoned request");
            return;
        }
    };

    let outcome = match (response.result, response.error) {
        (_, Some(err)) => Err(TransportError::Rpc {
            code: err.code,
            message: err.message,
        }),
        (Some(result), None) => Ok(result),
        (None, None) => Err(TransportError::Protocol(
            "response carries neither result nor error".into(),
        )),
    };
    let _ = waiter.send(outcome);
}

#[async_trait]
impl Session for StdioSession {
    async fn call(&self, method: &str, params: Option<Value>, timeout: Duration) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        {
            let mut map = self.pending.lock().expect("pending map poisoned");
            map.insert(id, tx);
        }

        let request = JsonRpcRequest::call(id, method, params);
        if let Err(err) = self.write_frame(&request).await {
            let mut map = self.pending.lock().expect("pending map poisoned");
            map.remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                // Deadline passed: abandon the id so a late response is
                // discarded instead of waking a dead waiter.
                let mut map = self.pending.lock().expect("pending map poisoned");
                map.remove(&id);
                Err(TransportError::Timeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.write_frame(&JsonRpcRequest::notification(method, params)).await
    }

    async fn disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(reader) = self.reader.lock().expect("reader handle poisoned").take() {
            reader.abort();
        }
        let mut child = self.child.lock().await;
        let _ = child.kill().await;
        let _ = child.wait().await;
    }
}
