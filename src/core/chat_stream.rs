use tokio::sync::mpsc;
use tracing::debug;

use crate::core::request::{CancelHandle, PendingRequest, RequestError};
use crate::core::stream_decoder::StreamDecoder;

#[derive(Debug)]
pub enum StreamEvent {
    Fragment(String),
    Completed,
    Failed(RequestError),
}

/// One issued request, ready to be driven to completion.
pub struct StreamJob {
    stream_id: u64,
    request: PendingRequest,
}

impl StreamJob {
    pub fn new(stream_id: u64, request: PendingRequest) -> Self {
        Self { stream_id, request }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn handle(&self) -> &CancelHandle {
        self.request.handle()
    }

    /// Awaits the response and emits its fragments in order. Exactly one of
    /// `Completed` or `Failed` is emitted last.
    pub async fn run<F>(self, mut emit: F)
    where
        F: FnMut(StreamEvent),
    {
        let stream_id = self.stream_id;
        let body = match self.request.response().await {
            Ok(body) => body,
            Err(err) => {
                emit(StreamEvent::Failed(err));
                return;
            }
        };
        debug!(stream_id, status = body.status, "response stream opened");

        let mut decoder = StreamDecoder::new(body.chunks);
        loop {
            match decoder.next_fragment().await {
                Ok(Some(fragment)) => emit(StreamEvent::Fragment(fragment)),
                Ok(None) => {
                    emit(StreamEvent::Completed);
                    return;
                }
                Err(err) => {
                    emit(StreamEvent::Failed(err));
                    return;
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamEvent, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, job: StreamJob) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let stream_id = job.stream_id();
            job.run(|event| {
                let _ = tx.send((event, stream_id));
            })
            .await;
        });
    }
}
