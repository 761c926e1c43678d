use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::core::config::data::Config;

pub const DEFAULT_API_URL: &str = "http://localhost:8001/api/stream";
pub const DEFAULT_STORAGE_KEY: &str = "chatHistory";
pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 50;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_TYPING_DELAY_MS: u64 = 500;

pub const ENV_API_URL: &str = "PARLEY_API_URL";
pub const ENV_STORAGE_KEY: &str = "PARLEY_STORAGE_KEY";
pub const ENV_MAX_HISTORY_ITEMS: &str = "PARLEY_MAX_HISTORY_ITEMS";
pub const ENV_REQUEST_TIMEOUT: &str = "PARLEY_REQUEST_TIMEOUT";
pub const ENV_TYPING_DELAY: &str = "PARLEY_TYPING_DELAY";

/// Effective runtime settings after defaults and overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub storage_key: String,
    pub max_history_items: usize,
    pub request_timeout: Duration,
    pub typing_delay: Duration,
    pub theme: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_history_items: DEFAULT_MAX_HISTORY_ITEMS,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            typing_delay: Duration::from_millis(DEFAULT_TYPING_DELAY_MS),
            theme: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Resolves the file values over the defaults, then applies environment
    /// overrides read through `env`.
    pub fn resolve_with<F>(&self, env: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
        if let Some(key) = &self.storage_key {
            settings.storage_key = key.clone();
        }
        if let Some(max) = self.max_history_items {
            settings.max_history_items = max;
        }
        if let Some(ms) = self.request_timeout {
            settings.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.typing_delay {
            settings.typing_delay = Duration::from_millis(ms);
        }
        settings.theme = self.theme.clone();
        settings.data_dir = self.data_dir.clone();

        if let Some(url) = non_empty(env(ENV_API_URL)) {
            settings.api_url = url;
        }
        if let Some(key) = non_empty(env(ENV_STORAGE_KEY)) {
            settings.storage_key = key;
        }
        if let Some(max) = parse_env(ENV_MAX_HISTORY_ITEMS, env(ENV_MAX_HISTORY_ITEMS)) {
            settings.max_history_items = max;
        }
        if let Some(ms) = parse_env::<u64>(ENV_REQUEST_TIMEOUT, env(ENV_REQUEST_TIMEOUT)) {
            settings.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env::<u64>(ENV_TYPING_DELAY, env(ENV_TYPING_DELAY)) {
            settings.typing_delay = Duration::from_millis(ms);
        }

        settings
    }

    pub fn resolve(&self) -> Settings {
        self.resolve_with(|name| std::env::var(name).ok())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
    let raw = non_empty(value)?;
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
