use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::message::Message;
use crate::core::storage::{KeyValueStore, PersistenceError};

/// Capped, append-only log of exchanged messages.
///
/// Persistence problems are logged and swallowed: a broken store degrades the
/// history to empty or unchanged, it never interrupts the chat.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    max_items: usize,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, max_items: usize) -> Self {
        Self {
            store,
            key: key.into(),
            max_items,
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Appends and persists, evicting the oldest entries past the cap.
    ///
    /// When the current log cannot be read the write is skipped, so a
    /// transient failure never replaces the stored log.
    pub fn append(&self, message: Message) {
        let mut log = match self.try_load() {
            Ok(log) => log.unwrap_or_default(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "skipping history save after failed read");
                return;
            }
        };
        log.push(message);
        let overflow = log.len().saturating_sub(self.max_items);
        if overflow > 0 {
            log.drain(..overflow);
        }

        if let Err(err) = self.persist(&log) {
            warn!(key = %self.key, error = %err, "failed to save history");
        }
    }

    pub fn load(&self) -> Vec<Message> {
        match self.try_load() {
            Ok(log) => log.unwrap_or_default(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read history");
                Vec::new()
            }
        }
    }

    /// `Ok(None)` when nothing usable is stored; unparseable data counts as
    /// nothing.
    fn try_load(&self) -> Result<Option<Vec<Message>>, PersistenceError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(log) => Ok(Some(log)),
            Err(err) => {
                debug!(key = %self.key, error = %err, "ignoring unparseable history");
                Ok(None)
            }
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.store.remove(&self.key) {
            warn!(key = %self.key, error = %err, "failed to clear history");
        }
    }

    fn persist(&self, log: &[Message]) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(log)?;
        self.store.set(&self.key, &encoded)
    }
}
