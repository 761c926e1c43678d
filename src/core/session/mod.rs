//! Chat session orchestration.
//!
//! [`ChatSessionController`] owns the session state, the view model, the
//! history log and the request controller. It is driven by three kinds of
//! input: user handlers (`submit`, `input_changed`), stream events tagged
//! with a stream id, and clock ticks for transient expiry. Stream jobs run
//! elsewhere; the controller only ever sees their events, in arrival order.

pub mod state;
pub mod view;

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::ChatRequest;
use crate::core::chat_stream::{StreamEvent, StreamJob};
use crate::core::history::HistoryStore;
use crate::core::message::Message;
use crate::core::request::{AbortReason, RequestController, RequestError};

pub use state::{ChatSessionState, SessionPhase, SubmitError};
pub use view::{
    EntryKind, Placeholder, RenderedMessage, TranscriptEntry, Transient, ViewModel, BUSY_WARNING,
    HISTORY_CLEARED, INPUT_HINT_BUSY, INPUT_HINT_IDLE, WELCOME_TEXT,
};

/// Bookkeeping for the request currently in flight.
#[derive(Debug)]
struct InFlight {
    stream_id: u64,
    placeholder_id: String,
    /// Trimmed text that was sent.
    submitted: String,
    /// Input box contents at submit time, untrimmed.
    raw_input: String,
}

pub struct ChatSessionController {
    state: ChatSessionState,
    phase: SessionPhase,
    view: ViewModel,
    history: HistoryStore,
    requests: RequestController,
    timeout: Duration,
    inflight: Option<InFlight>,
    next_stream_id: u64,
}

impl ChatSessionController {
    pub fn new(history: HistoryStore, requests: RequestController, timeout: Duration) -> Self {
        Self {
            state: ChatSessionState::default(),
            phase: SessionPhase::Idle,
            view: ViewModel::new(),
            history,
            requests,
            timeout,
            inflight: None,
            next_stream_id: 1,
        }
    }

    pub fn state(&self) -> &ChatSessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewModel {
        &mut self.view
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn endpoint(&self) -> &str {
        self.requests.endpoint()
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.inflight
            .as_ref()
            .is_some_and(|inflight| inflight.stream_id == stream_id)
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        !self.state.is_processing && !self.view.input().trim().is_empty()
    }

    pub fn input_hint(&self) -> &'static str {
        if self.state.is_processing {
            INPUT_HINT_BUSY
        } else {
            INPUT_HINT_IDLE
        }
    }

    /// Rebuilds the transcript from the persisted log.
    pub fn restore_history(&mut self) {
        let log = self.history.load();
        debug!(messages = log.len(), "restoring transcript from history");
        self.view.reset_transcript();
        for message in &log {
            self.view.push_message(RenderedMessage::from_message(message));
        }
    }

    /// Handler for edits to the input box. Text typed while a reply is
    /// streaming is also kept as the draft.
    pub fn input_changed(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.state.is_processing {
            self.state.draft_message = text.clone();
        }
        self.view.sync_input(text);
    }

    /// Handler for the send action.
    ///
    /// On success the caller must run the returned job and feed its events
    /// back through [`handle_stream_event`](Self::handle_stream_event).
    pub fn submit(&mut self) -> Result<StreamJob, SubmitError> {
        if self.state.is_processing {
            debug!("submission rejected while a response is in progress");
            self.view.show_tooltip(BUSY_WARNING, Instant::now());
            return Err(SubmitError::Busy);
        }

        let raw_input = self.view.input().to_string();
        let submitted = raw_input.trim().to_string();
        if submitted.is_empty() {
            return Err(SubmitError::Empty);
        }

        let message = Message::user(submitted.clone());
        self.view.push_message(RenderedMessage::from_message(&message));
        self.history.append(message);
        self.view.set_input(String::new());
        self.state.draft_message.clear();

        let stream_id = self.next_stream_id;
        self.next_stream_id += 1;
        let placeholder_id = format!("pending-{stream_id}");
        self.view.push_placeholder(Placeholder::new(placeholder_id.clone()));

        let request = self
            .requests
            .send(&ChatRequest::new(submitted.clone()), self.timeout);
        self.state.is_processing = true;
        self.state.active_request = Some(request.handle().clone());
        self.phase = SessionPhase::Sending;

        info!(
            stream_id,
            chars = submitted.chars().count(),
            "message submitted"
        );
        self.inflight = Some(InFlight {
            stream_id,
            placeholder_id,
            submitted,
            raw_input,
        });

        Ok(StreamJob::new(stream_id, request))
    }

    /// Applies one event from a stream job. Events from any stream other
    /// than the current one are ignored; returns whether anything changed.
    pub fn handle_stream_event(&mut self, stream_id: u64, event: StreamEvent) -> bool {
        if !self.is_current_stream(stream_id) {
            debug!(stream_id, "ignoring event from stale stream");
            return false;
        }

        match event {
            StreamEvent::Fragment(fragment) => self.append_fragment(&fragment),
            StreamEvent::Completed => self.finalize(),
            StreamEvent::Failed(err) => self.fail(err),
        }
        true
    }

    /// Expires tooltips and notifications; returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.view.expire_transients(now)
    }

    /// Removes persisted history and returns the view to its welcome state.
    /// A reply still streaming is abandoned.
    pub fn clear_history(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            debug!(
                stream_id = inflight.stream_id,
                "abandoning in-flight reply on history clear"
            );
            self.requests.cancel();
            self.reset_processing();
        }

        self.history.clear();
        self.view.reset_transcript();
        self.view.set_input(String::new());
        self.view.show_notification(HISTORY_CLEARED, Instant::now());
        info!("chat history cleared");
    }

    /// Cancels any in-flight request; used when the front-end exits.
    pub fn shutdown(&mut self) {
        if self.inflight.is_some() {
            self.requests.cancel();
            self.fail(RequestError::Aborted(AbortReason::Cancelled));
        }
    }

    fn append_fragment(&mut self, fragment: &str) {
        let Some(inflight) = &self.inflight else {
            return;
        };
        if let Some(placeholder) = self.view.placeholder_mut(&inflight.placeholder_id) {
            placeholder.append(fragment);
        }
        self.view.scroll_to_bottom();
    }

    fn finalize(&mut self) {
        let Some(inflight) = self.inflight.take() else {
            return;
        };
        self.phase = SessionPhase::Finalizing;

        let content = self
            .view
            .placeholder(&inflight.placeholder_id)
            .map(|placeholder| placeholder.accumulated.clone())
            .unwrap_or_default();
        debug!(
            stream_id = inflight.stream_id,
            chars = content.chars().count(),
            "reply complete"
        );

        let message = Message::assistant(content);
        self.view.replace_placeholder(
            &inflight.placeholder_id,
            RenderedMessage::from_message(&message),
        );
        self.history.append(message);
        self.finish_request(inflight);
    }

    fn fail(&mut self, err: RequestError) {
        let Some(inflight) = self.inflight.take() else {
            return;
        };
        warn!(stream_id = inflight.stream_id, error = %err, "chat request failed");

        self.view
            .replace_placeholder(&inflight.placeholder_id, RenderedMessage::error(&err));
        self.finish_request(inflight);
    }

    /// Shared exit path for every settled request.
    fn finish_request(&mut self, inflight: InFlight) {
        self.reset_processing();

        if self.state.draft_message.is_empty() && inflight.raw_input != inflight.submitted {
            self.view.set_input(inflight.raw_input);
        }
        self.view.scroll_to_bottom();
    }

    fn reset_processing(&mut self) {
        self.state.is_processing = false;
        self.state.active_request = None;
        self.requests.release();
        self.phase = SessionPhase::Idle;
    }
}
