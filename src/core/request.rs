//! Outbound chat requests with timeout and cooperative cancellation.
//!
//! A [`RequestController`] issues one POST at a time. Every request gets a
//! [`CancelHandle`]; a timer task cancels the handle when the deadline passes,
//! and the response body stream observes the same handle so an abort is seen
//! no matter which await point the consumer is parked on.

use std::error::Error as StdError;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatRequest;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RequestError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    TimedOut(Duration),
    Cancelled,
}

#[derive(Debug)]
pub enum RequestError {
    /// The connection failed or broke mid-body.
    Transport(String),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The request was cancelled, either explicitly or by its deadline.
    Aborted(AbortReason),
    /// The payload could not be encoded.
    Encode(serde_json::Error),
}

impl RequestError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestError::Aborted(AbortReason::TimedOut(_)))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RequestError::Aborted(_))
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Transport(message) => write!(f, "network error: {message}"),
            RequestError::Status(status) => write!(f, "HTTP error: {status}"),
            RequestError::Aborted(AbortReason::TimedOut(after)) => {
                write!(f, "request timed out after {} ms", after.as_millis())
            }
            RequestError::Aborted(AbortReason::Cancelled) => write!(f, "request aborted"),
            RequestError::Encode(source) => write!(f, "failed to encode request: {source}"),
        }
    }
}

impl StdError for RequestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RequestError::Encode(source) => Some(source),
            _ => None,
        }
    }
}

pub struct TransportResponse {
    pub status: u16,
    pub body: ByteStream,
}

/// The network seam: posts a JSON body and hands back the raw chunked reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, RequestError>;
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, RequestError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RequestError::Transport(e.to_string())));

        Ok(TransportResponse {
            status,
            body: Box::pin(body),
        })
    }
}

/// Shared cancellation state for one request.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    timer: CancellationToken,
    reason: Arc<OnceLock<AbortReason>>,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            timer: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Cancels the request and clears its timer. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.abort(AbortReason::Cancelled);
    }

    /// Clears the timer without cancelling the request.
    pub fn disarm(&self) {
        self.timer.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_armed(&self) -> bool {
        !self.timer.is_cancelled()
    }

    /// First recorded abort reason; later aborts do not overwrite it.
    pub fn reason(&self) -> Option<AbortReason> {
        self.reason.get().copied()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    fn abort(&self, reason: AbortReason) {
        let _ = self.reason.set(reason);
        self.timer.cancel();
        self.token.cancel();
    }

    fn abort_error(&self) -> RequestError {
        RequestError::Aborted(self.reason().unwrap_or(AbortReason::Cancelled))
    }

    fn arm_timer(&self, timeout: Duration) {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    debug!(timeout_ms = timeout.as_millis() as u64, "request deadline reached");
                    handle.abort(AbortReason::TimedOut(timeout));
                }
                _ = handle.timer.cancelled() => {}
            }
        });
    }
}

/// A successful response: the status plus a cancel-aware chunk stream.
pub struct StreamedBody {
    pub status: u16,
    pub chunks: ByteStream,
}

/// An issued request whose response has not been awaited yet.
pub struct PendingRequest {
    handle: CancelHandle,
    task: JoinHandle<Result<StreamedBody, RequestError>>,
}

impl PendingRequest {
    pub fn handle(&self) -> &CancelHandle {
        &self.handle
    }

    pub async fn response(self) -> Result<StreamedBody, RequestError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => {
                self.handle.disarm();
                Err(RequestError::Transport(format!("request task failed: {err}")))
            }
        }
    }
}

#[derive(Clone)]
pub struct RequestController {
    transport: Arc<dyn Transport>,
    endpoint: String,
    active: Option<CancelHandle>,
}

impl RequestController {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            active: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn active(&self) -> Option<&CancelHandle> {
        self.active.as_ref()
    }

    /// Starts the network call on its own task and arms its deadline.
    ///
    /// Must be called from within a tokio runtime. Callers are responsible for
    /// not starting a second request while one is active.
    pub fn send(&mut self, payload: &ChatRequest, timeout: Duration) -> PendingRequest {
        let handle = CancelHandle::new();
        handle.arm_timer(timeout);
        self.active = Some(handle.clone());

        let encoded = serde_json::to_vec(payload).map_err(RequestError::Encode);
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let guard = handle.clone();

        let task = tokio::spawn(async move {
            let result = open_stream(transport, &endpoint, encoded, guard.clone()).await;
            if result.is_err() {
                guard.disarm();
            }
            result
        });

        PendingRequest { handle, task }
    }

    /// Cancels the active request, if any, and forgets it.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }

    /// Forgets the active request after it settled, clearing its timer.
    pub fn release(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.disarm();
        }
    }
}

async fn open_stream(
    transport: Arc<dyn Transport>,
    endpoint: &str,
    encoded: Result<Vec<u8>, RequestError>,
    guard: CancelHandle,
) -> Result<StreamedBody, RequestError> {
    let body = encoded?;
    debug!(endpoint, bytes = body.len(), "sending chat request");

    let response = tokio::select! {
        biased;
        _ = guard.cancelled() => return Err(guard.abort_error()),
        response = transport.post_json(endpoint, body) => response?,
    };

    if !(200..300).contains(&response.status) {
        return Err(RequestError::Status(response.status));
    }

    Ok(StreamedBody {
        status: response.status,
        chunks: guard_body(response.body, guard),
    })
}

/// Ends the body with an abort error as soon as the handle is cancelled and
/// clears the timer once the body is fully drained.
fn guard_body(body: ByteStream, handle: CancelHandle) -> ByteStream {
    Box::pin(stream::unfold(Some((body, handle)), |state| async move {
        let (mut body, handle) = state?;
        tokio::select! {
            biased;
            _ = handle.cancelled() => Some((Err(handle.abort_error()), None)),
            next = body.next() => match next {
                Some(Ok(bytes)) => Some((Ok(bytes), Some((body, handle)))),
                Some(Err(err)) => {
                    handle.disarm();
                    Some((Err(err), None))
                }
                None => {
                    handle.disarm();
                    None
                }
            },
        }
    }))
}
