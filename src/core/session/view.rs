//! Toolkit-independent view model of the chat screen.
//!
//! The session controller is the only writer of transcript entries. The
//! input text is shared: the terminal front-end mirrors keystrokes into it
//! with [`ViewModel::sync_input`], while controller-side rewrites go through
//! [`ViewModel::set_input`] and bump the revision so the front-end reloads
//! its editor.

use std::time::{Duration, Instant};

use chrono::Utc;

use crate::core::format::format_message_content;
use crate::core::message::{time_label, Message};
use crate::core::request::RequestError;

pub const WELCOME_TEXT: &str = "How can I help you?\nI am your personal assistant.";
pub const BUSY_WARNING: &str = "Please wait for the previous response.";
pub const HISTORY_CLEARED: &str = "Chat history cleared successfully";
pub const INPUT_HINT_IDLE: &str = "Type your message...";
pub const INPUT_HINT_BUSY: &str = "You can keep typing...";
pub const TOOLTIP_TTL: Duration = Duration::from_millis(2_000);
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Error,
}

/// A finished transcript row. User bodies are plain text; assistant and
/// error bodies carry formatter markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub kind: EntryKind,
    pub body: String,
    pub time_label: String,
}

impl RenderedMessage {
    pub fn from_message(message: &Message) -> Self {
        if message.is_user {
            Self {
                kind: EntryKind::User,
                body: message.content.clone(),
                time_label: message.time_label(),
            }
        } else {
            Self {
                kind: EntryKind::Assistant,
                body: format_message_content(&message.content),
                time_label: message.time_label(),
            }
        }
    }

    pub fn error(err: &RequestError) -> Self {
        Self {
            kind: EntryKind::Error,
            body: format_message_content(&format!("Error: {err}")),
            time_label: time_label(Utc::now()),
        }
    }
}

/// Render target for a reply that is still streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub id: String,
    pub accumulated: String,
    pub rendered: String,
    pub started_at: Instant,
    pub time_label: String,
}

impl Placeholder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            accumulated: String::new(),
            rendered: String::new(),
            started_at: Instant::now(),
            time_label: time_label(Utc::now()),
        }
    }

    /// True until the first fragment arrives.
    pub fn is_waiting(&self) -> bool {
        self.accumulated.is_empty()
    }

    /// Formatting spans may cross fragment boundaries, so the whole
    /// accumulated text is re-rendered on every append.
    pub fn append(&mut self, fragment: &str) {
        self.accumulated.push_str(fragment);
        self.rendered = format_message_content(&self.accumulated);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message(RenderedMessage),
    Pending(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transient {
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct ViewModel {
    entries: Vec<TranscriptEntry>,
    input: String,
    input_revision: u64,
    tooltip: Option<Transient>,
    notification: Option<Transient>,
    scroll_back: u16,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// An empty transcript shows the welcome message.
    pub fn is_welcome(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_message(&self) -> Option<&RenderedMessage> {
        self.entries.iter().rev().find_map(|entry| match entry {
            TranscriptEntry::Message(message) => Some(message),
            TranscriptEntry::Pending(_) => None,
        })
    }

    pub fn placeholder(&self, id: &str) -> Option<&Placeholder> {
        self.entries.iter().find_map(|entry| match entry {
            TranscriptEntry::Pending(p) if p.id == id => Some(p),
            _ => None,
        })
    }

    pub fn placeholder_mut(&mut self, id: &str) -> Option<&mut Placeholder> {
        self.entries.iter_mut().find_map(|entry| match entry {
            TranscriptEntry::Pending(p) if p.id == id => Some(p),
            _ => None,
        })
    }

    pub fn push_message(&mut self, message: RenderedMessage) {
        self.entries.push(TranscriptEntry::Message(message));
        self.scroll_to_bottom();
    }

    pub fn push_placeholder(&mut self, placeholder: Placeholder) {
        self.entries.push(TranscriptEntry::Pending(placeholder));
        self.scroll_to_bottom();
    }

    /// Swaps the placeholder for its final rendering in place. Falls back to
    /// appending when the placeholder is already gone.
    pub fn replace_placeholder(&mut self, id: &str, message: RenderedMessage) {
        let position = self
            .entries
            .iter()
            .position(|entry| matches!(entry, TranscriptEntry::Pending(p) if p.id == id));
        match position {
            Some(index) => self.entries[index] = TranscriptEntry::Message(message),
            None => self.entries.push(TranscriptEntry::Message(message)),
        }
        self.scroll_to_bottom();
    }

    pub fn reset_transcript(&mut self) {
        self.entries.clear();
        self.scroll_to_bottom();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_revision(&self) -> u64 {
        self.input_revision
    }

    /// Controller-side rewrite of the input box.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.input_revision += 1;
    }

    /// Front-end mirror of what the user typed.
    pub fn sync_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn tooltip(&self) -> Option<&Transient> {
        self.tooltip.as_ref()
    }

    pub fn notification(&self) -> Option<&Transient> {
        self.notification.as_ref()
    }

    /// Replaces any visible tooltip.
    pub fn show_tooltip(&mut self, text: impl Into<String>, now: Instant) {
        self.tooltip = Some(Transient {
            text: text.into(),
            expires_at: now + TOOLTIP_TTL,
        });
    }

    pub fn show_notification(&mut self, text: impl Into<String>, now: Instant) {
        self.notification = Some(Transient {
            text: text.into(),
            expires_at: now + NOTIFICATION_TTL,
        });
    }

    /// Drops transients whose time is up; returns whether anything changed.
    pub fn expire_transients(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for slot in [&mut self.tooltip, &mut self.notification] {
            if slot.as_ref().is_some_and(|t| t.expires_at <= now) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    /// Lines scrolled up from the bottom of the transcript.
    pub fn scroll_back(&self) -> u16 {
        self.scroll_back
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    /// Keeps the offset within what the last layout could actually show.
    pub fn clamp_scroll(&mut self, max: u16) {
        self.scroll_back = self.scroll_back.min(max);
    }
}
