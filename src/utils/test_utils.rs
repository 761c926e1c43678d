use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};

use crate::core::config::Settings;
use crate::core::history::HistoryStore;
use crate::core::request::{
    ByteStream, RequestController, RequestError, Transport, TransportResponse,
};
use crate::core::session::ChatSessionController;
use crate::core::storage::{KeyValueStore, MemoryStore};

/// What a [`ScriptedTransport`] does when it receives a request.
#[derive(Debug, Clone)]
pub enum Script {
    Respond {
        status: u16,
        chunks: Vec<Vec<u8>>,
        stall_after: bool,
    },
    Fail(String),
    Hang,
}

impl Script {
    pub fn ok<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Script::Respond {
            status: 200,
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            stall_after: false,
        }
    }

    /// Sends the chunks, then never finishes the body.
    pub fn stalled<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        match Script::ok(chunks) {
            Script::Respond { status, chunks, .. } => Script::Respond {
                status,
                chunks,
                stall_after: true,
            },
            other => other,
        }
    }

    pub fn status(status: u16) -> Self {
        Script::Respond {
            status,
            chunks: Vec::new(),
            stall_after: false,
        }
    }
}

pub struct ScriptedTransport {
    script: Mutex<Script>,
    requests: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<u8>)> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, RequestError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push((url.to_string(), body));
        let script = self.script.lock().expect("script lock").clone();

        match script {
            Script::Respond {
                status,
                chunks,
                stall_after,
            } => {
                let items = stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))));
                let body: ByteStream = if stall_after {
                    Box::pin(items.chain(stream::pending()))
                } else {
                    Box::pin(items)
                };
                Ok(TransportResponse { status, body })
            }
            Script::Fail(message) => Err(RequestError::Transport(message)),
            Script::Hang => futures_util::future::pending().await,
        }
    }
}

pub fn test_settings() -> Settings {
    Settings {
        api_url: "http://chat.test/api/stream".to_string(),
        storage_key: "chatHistory".to_string(),
        max_history_items: 50,
        request_timeout: Duration::from_millis(15_000),
        typing_delay: Duration::from_millis(500),
        ..Settings::default()
    }
}

pub struct TestSession {
    pub controller: ChatSessionController,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryStore>,
}

pub fn create_test_session(script: Script) -> TestSession {
    create_test_session_with(script, test_settings())
}

pub fn create_test_session_with(script: Script, settings: Settings) -> TestSession {
    create_test_session_on(script, settings, Arc::new(MemoryStore::new()))
}

pub fn create_test_session_on(
    script: Script,
    settings: Settings,
    store: Arc<MemoryStore>,
) -> TestSession {
    let transport = Arc::new(ScriptedTransport::new(script));
    let history = HistoryStore::new(
        store.clone() as Arc<dyn KeyValueStore>,
        settings.storage_key.clone(),
        settings.max_history_items,
    );
    let requests = RequestController::new(transport.clone(), settings.api_url.clone());
    let controller = ChatSessionController::new(history, requests, settings.request_timeout);
    TestSession {
        controller,
        transport,
        store,
    }
}
