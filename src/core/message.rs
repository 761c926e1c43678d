use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A single exchanged message as it is kept in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }

    /// Short local wall-clock label shown next to a rendered message.
    pub fn time_label(&self) -> String {
        time_label(self.timestamp)
    }
}

pub fn time_label(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_fields() {
        let message = Message {
            content: "hi".into(),
            is_user: true,
            timestamp: "2024-05-01T10:20:30Z".parse().expect("timestamp"),
        };
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["isUser"], true);
        assert_eq!(json["timestamp"], "2024-05-01T10:20:30Z");
    }

    #[test]
    fn parses_browser_style_timestamps() {
        let raw = r#"{"content":"ok","isUser":false,"timestamp":"2024-05-01T10:20:30.123Z"}"#;
        let message: Message = serde_json::from_str(raw).expect("parse");
        assert!(!message.is_user);
        assert_eq!(message.timestamp.timestamp_subsec_millis(), 123);
    }
}
