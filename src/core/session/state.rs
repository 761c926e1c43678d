use std::error::Error as StdError;
use std::fmt;

use crate::core::request::CancelHandle;

/// Mutable session state owned by one controller.
///
/// `active_request` is present exactly while `is_processing` is set.
#[derive(Debug, Default)]
pub struct ChatSessionState {
    pub is_processing: bool,
    pub active_request: Option<CancelHandle>,
    pub draft_message: String,
}

impl ChatSessionState {
    pub fn is_consistent(&self) -> bool {
        self.is_processing == self.active_request.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    /// Placeholder rendered; waiting for or reading the reply.
    Sending,
    /// Reply complete; writing the final render and persisting.
    Finalizing,
}

/// Why a submission was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Nothing but whitespace in the input.
    Empty,
    /// A reply is still streaming.
    Busy,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Empty => write!(f, "message is empty"),
            SubmitError::Busy => write!(f, "a response is still in progress"),
        }
    }
}

impl StdError for SubmitError {}
