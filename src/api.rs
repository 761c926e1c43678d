use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Body of the streaming chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub client_timestamp: String,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(message, Utc::now())
    }

    pub fn at(message: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            client_timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            stream: true,
        }
    }
}
