//! Child-process transport for the analyzer.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Callers waiting for a response, keyed by request id.
#[derive(Clone, Default)]
struct Pending(Arc<Mutex<Waiting>>);

#[derive(Default)]
struct Waiting {
    callers: HashMap<String, oneshot::Sender<ResponseEnvelope>>,
    /// Set once the reader has stopped; nothing will be answered after it.
    closed: bool,
}

impl Pending {
    /// `None` when the reader has already stopped.
    async fn register(&self, id: &str) -> Option<oneshot::Receiver<ResponseEnvelope>> {
        let mut waiting = self.0.lock().await;
        if waiting.closed {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        waiting.callers.insert(id.to_string(), tx);
        Some(rx)
    }

    async fn complete(&self, response: ResponseEnvelope) {
        match self.0.lock().await.callers.remove(&response.id) {
            Some(tx) => {
                // The caller may have timed out and dropped its receiver
                let _ = tx.send(response);
            }
            None => debug!(id = %response.id, "response for unknown or expired request"),
        }
    }

    async fn forget(&self, id: &str) {
        self.0.lock().await.callers.remove(id);
    }

    /// Fail every waiting caller and refuse new ones; returns how many
    /// were waiting.
    async fn fail_all(&self) -> usize {
        let mut waiting = self.0.lock().await;
        waiting.closed = true;
        let count = waiting.callers.len();
        for (id, tx) in waiting.callers.drain() {
            let _ = tx.send(ResponseEnvelope::worker_exited(id));
        }
        count
    }
}

/// Handle to a running analyzer process.
///
/// Requests are written as single JSON lines to the process's stdin and
/// matched to responses on stdout by id, so several requests may be in
/// flight at once. The process is killed when the client is dropped.
///
/// # Example
///
/// ```ignore
/// use sluice::worker::WorkerClient;
/// use sluice::worker::protocol::{methods, ColumnLineageParams};
///
/// let client = WorkerClient::spawn("./sqlglot-worker", &[]).await?;
/// let lineage: LineageResult = client
///     .request(methods::COLUMN_LINEAGE, ColumnLineageParams { query, dialect, schema: &schema })
///     .await?;
/// ```
pub struct WorkerClient {
    stdin: Mutex<BufWriter<ChildStdin>>,
    pending: Pending,
    reader: JoinHandle<()>,
    timeout: Duration,
    _child: Child,
}

impl WorkerClient {
    pub async fn spawn<P: AsRef<Path>>(program: P, args: &[String]) -> WorkerResult<Self> {
        Self::spawn_with_timeout(program, args, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    pub async fn spawn_with_timeout<P: AsRef<Path>>(
        program: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::Spawn)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(WorkerError::Spawn(io::Error::other(
                "analyzer stdio was not captured",
            )));
        };

        let pending = Pending::default();
        let reader = tokio::spawn(read_responses(BufReader::new(stdout), pending.clone()));
        debug!(program = %program.display(), ?args, "analyzer started");

        Ok(Self {
            stdin: Mutex::new(BufWriter::new(stdin)),
            pending,
            reader,
            timeout,
            _child: child,
        })
    }

    /// Call `method` and decode the result as `R`.
    ///
    /// A request that times out is forgotten; a late answer is discarded.
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if !self.is_alive() {
            return Err(WorkerError::Exited);
        }

        let request = RequestEnvelope {
            id: uuid::Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::Encode)?,
        };

        let Some(rx) = self.pending.register(&request.id).await else {
            return Err(WorkerError::Exited);
        };
        if let Err(err) = self.send(&request).await {
            self.pending.forget(&request.id).await;
            return Err(err);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(response) => decode(response?),
            Err(_) => {
                self.pending.forget(&request.id).await;
                warn!(method, timeout = ?self.timeout, "analyzer request timed out");
                Err(WorkerError::Timeout(self.timeout))
            }
        }
    }

    async fn send(&self, request: &RequestEnvelope) -> WorkerResult<()> {
        let mut line = serde_json::to_vec(request).map_err(WorkerError::Encode)?;
        line.push(b'\n');

        let mut stdin = self.stdin.lock().await;
        stdin.write_all(&line).await.map_err(WorkerError::Send)?;
        stdin.flush().await.map_err(WorkerError::Send)
    }

    /// False once the analyzer has closed its stdout.
    pub fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_responses(stdout: BufReader<ChildStdout>, pending: Pending) {
    let mut lines = stdout.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                Ok(response) => pending.complete(response).await,
                Err(e) => warn!(error = %e, "discarding malformed analyzer response"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed reading analyzer output");
                break;
            }
        }
    }

    let failed = pending.fail_all().await;
    if failed > 0 {
        warn!(failed, "analyzer exited with requests in flight");
    }
}

fn decode<R: DeserializeOwned>(response: ResponseEnvelope) -> WorkerResult<R> {
    if !response.success {
        let info = response.error.unwrap_or_else(|| ErrorInfo {
            code: "UNKNOWN".to_string(),
            message: "analyzer reported a failure without details".to_string(),
        });
        return Err(WorkerError::from_error_info(info));
    }
    serde_json::from_value(response.result.unwrap_or_default()).map_err(WorkerError::Decode)
}
