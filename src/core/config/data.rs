use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration. Every key is optional; unset keys fall back to the
/// built-in defaults when resolved into [`Settings`](super::Settings).
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Streaming chat endpoint (POST)
    pub api_url: Option<String>,
    /// Storage key the history log is kept under
    pub storage_key: Option<String>,
    /// Maximum number of messages kept in the history log
    pub max_history_items: Option<usize>,
    /// Request deadline in milliseconds
    pub request_timeout: Option<u64>,
    /// Typing cursor blink interval in milliseconds
    pub typing_delay: Option<u64>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
    /// Directory holding the local key-value store
    pub data_dir: Option<PathBuf>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
