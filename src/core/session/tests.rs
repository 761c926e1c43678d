use std::sync::Arc;
use std::time::{Duration, Instant};

use super::*;
use crate::core::chat_stream::{StreamEvent, StreamJob};
use crate::core::request::{AbortReason, RequestError};
use crate::core::storage::{KeyValueStore, MemoryStore};
use crate::utils::test_utils::{
    create_test_session, create_test_session_on, create_test_session_with, test_settings, Script,
};

/// Drives a job to completion, feeding its events back into the controller.
async fn run_job(controller: &mut ChatSessionController, job: StreamJob) {
    let stream_id = job.stream_id();
    let mut events = Vec::new();
    job.run(|event| events.push(event)).await;
    for event in events {
        controller.handle_stream_event(stream_id, event);
        assert!(controller.state().is_consistent());
    }
}

/// Lets spawned request tasks reach the transport.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn last_body(controller: &ChatSessionController) -> String {
    controller
        .view()
        .last_message()
        .map(|message| message.body.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn whitespace_only_input_is_not_sent() {
    let mut session = create_test_session(Script::ok(["unused"]));
    session.controller.input_changed("   \n ");

    assert_eq!(session.controller.submit().err(), Some(SubmitError::Empty));
    assert!(session.transport.requests().is_empty());
    assert!(session.controller.view().is_welcome());
    assert!(!session.controller.state().is_processing);
}

#[tokio::test]
async fn streamed_reply_is_rendered_and_persisted() {
    let mut session = create_test_session(Script::ok(["Hel", "lo **wo", "rld**"]));
    session.controller.input_changed("  hi there ");
    let job = session.controller.submit().expect("submit");

    assert!(session.controller.state().is_processing);
    assert!(session.controller.state().is_consistent());
    assert_eq!(session.controller.phase(), SessionPhase::Sending);
    assert_eq!(session.controller.input_hint(), INPUT_HINT_BUSY);
    assert!(session
        .controller
        .view()
        .placeholder(&format!("pending-{}", job.stream_id()))
        .is_some_and(Placeholder::is_waiting));

    run_job(&mut session.controller, job).await;

    assert!(!session.controller.state().is_processing);
    assert_eq!(session.controller.phase(), SessionPhase::Idle);
    assert_eq!(last_body(&session.controller), "Hello <strong>world</strong>");
    assert_eq!(session.controller.view().entries().len(), 2);

    let log = session.controller.history().load();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "hi there");
    assert!(log[0].is_user);
    assert_eq!(log[1].content, "Hello **world**");
    assert!(!log[1].is_user);

    let (url, body) = &session.transport.requests()[0];
    assert_eq!(url, "http://chat.test/api/stream");
    let payload: serde_json::Value = serde_json::from_slice(body).expect("json");
    assert_eq!(payload["message"], "hi there");
    assert_eq!(payload["stream"], true);
}

#[tokio::test]
async fn busy_submit_shows_tooltip_and_sends_nothing() {
    let mut session = create_test_session(Script::stalled(["..."]));
    session.controller.input_changed("first");
    let _job = session.controller.submit().expect("submit");
    settle().await;
    assert_eq!(session.transport.requests().len(), 1);

    session.controller.input_changed("second");
    assert_eq!(session.controller.submit().err(), Some(SubmitError::Busy));
    settle().await;

    assert_eq!(session.transport.requests().len(), 1);
    let tooltip = session.controller.view().tooltip().expect("tooltip");
    assert_eq!(tooltip.text, BUSY_WARNING);
    assert_eq!(session.controller.view().input(), "second");
    assert!(!session.controller.can_send());
}

#[tokio::test(start_paused = true)]
async fn stalled_request_times_out_into_an_error_entry() {
    let settings = test_settings();
    let timeout = settings.request_timeout;
    let mut session = create_test_session_with(Script::Hang, settings);
    session.controller.input_changed("anyone?");
    let job = session.controller.submit().expect("submit");

    run_job(&mut session.controller, job).await;

    let last = session.controller.view().last_message().expect("entry");
    assert_eq!(last.kind, EntryKind::Error);
    assert_eq!(
        last.body,
        format!(
            "Error: {}",
            RequestError::Aborted(AbortReason::TimedOut(timeout))
        )
    );
    assert!(!session.controller.state().is_processing);
    assert_eq!(session.controller.history().load().len(), 1);
}

#[tokio::test]
async fn non_success_status_renders_http_error() {
    let mut session = create_test_session(Script::status(500));
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");

    run_job(&mut session.controller, job).await;

    assert_eq!(last_body(&session.controller), "Error: HTTP error: 500");
    assert!(!session.controller.can_send());
    assert_eq!(session.controller.input_hint(), INPUT_HINT_IDLE);
}

#[tokio::test]
async fn network_failure_renders_error_and_next_submit_works() {
    let mut session = create_test_session(Script::Fail("connection refused".into()));
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");

    run_job(&mut session.controller, job).await;

    let last = session.controller.view().last_message().expect("entry");
    assert_eq!(last.kind, EntryKind::Error);
    assert_eq!(last.body, "Error: network error: connection refused");
    assert!(!session.controller.state().is_processing);
    assert_eq!(session.controller.phase(), SessionPhase::Idle);

    let log = session.controller.history().load();
    assert_eq!(log.len(), 1);
    assert!(log[0].is_user);

    session.controller.input_changed("again");
    let retry = session.controller.submit().expect("second submit");
    run_job(&mut session.controller, retry).await;
    assert_eq!(session.transport.requests().len(), 2);
    assert_eq!(session.controller.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn failed_history_writes_stay_out_of_the_transcript() {
    let store = Arc::new(MemoryStore::failing_writes());
    let mut session = create_test_session_on(Script::ok(["fine"]), test_settings(), store);
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");

    run_job(&mut session.controller, job).await;

    assert_eq!(last_body(&session.controller), "fine");
    let errors = session
        .controller
        .view()
        .entries()
        .iter()
        .filter(|entry| {
            matches!(entry, TranscriptEntry::Message(message) if message.kind == EntryKind::Error)
        })
        .count();
    assert_eq!(errors, 0);
    assert!(!session.controller.state().is_processing);
    assert_eq!(session.controller.phase(), SessionPhase::Idle);
    assert!(session.controller.history().load().is_empty());
}

#[tokio::test]
async fn events_from_stale_streams_are_ignored() {
    let mut session = create_test_session(Script::stalled(["x"]));
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");
    let stale = job.stream_id() + 7;

    let changed = session
        .controller
        .handle_stream_event(stale, StreamEvent::Fragment("nope".into()));
    assert!(!changed);
    assert!(session.controller.state().is_processing);

    assert!(session
        .controller
        .handle_stream_event(job.stream_id(), StreamEvent::Completed));
    assert!(!session
        .controller
        .handle_stream_event(job.stream_id(), StreamEvent::Completed));
}

#[tokio::test]
async fn draft_typed_while_busy_is_kept() {
    let mut session = create_test_session(Script::stalled(["..."]));
    session.controller.input_changed(" padded ");
    let job = session.controller.submit().expect("submit");
    let stream_id = job.stream_id();

    session.controller.input_changed("next question");
    assert_eq!(session.controller.state().draft_message, "next question");
    session
        .controller
        .handle_stream_event(stream_id, StreamEvent::Completed);

    assert_eq!(session.controller.view().input(), "next question");
    assert!(session.controller.can_send());
}

#[tokio::test]
async fn untrimmed_input_is_restored_when_no_draft_was_typed() {
    let mut session = create_test_session(Script::ok(["done"]));
    session.controller.input_changed(" padded ");
    let job = session.controller.submit().expect("submit");
    assert_eq!(session.controller.view().input(), "");

    run_job(&mut session.controller, job).await;
    assert_eq!(session.controller.view().input(), " padded ");
}

#[tokio::test]
async fn trimmed_input_is_not_restored() {
    let mut session = create_test_session(Script::ok(["done"]));
    session.controller.input_changed("exact");
    let job = session.controller.submit().expect("submit");

    run_job(&mut session.controller, job).await;
    assert_eq!(session.controller.view().input(), "");
}

#[tokio::test]
async fn clear_history_resets_view_and_store() {
    let mut session = create_test_session(Script::ok(["reply"]));
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");
    run_job(&mut session.controller, job).await;

    session.controller.clear_history();

    assert!(session.controller.view().is_welcome());
    assert!(session.controller.history().load().is_empty());
    assert_eq!(session.store.get("chatHistory").expect("get"), None);
    let notification = session.controller.view().notification().expect("notice");
    assert_eq!(notification.text, HISTORY_CLEARED);
}

#[tokio::test]
async fn clear_history_abandons_in_flight_reply() {
    let mut session = create_test_session(Script::stalled(["partial"]));
    session.controller.input_changed("hello");
    let job = session.controller.submit().expect("submit");
    let stream_id = job.stream_id();
    let handle = job.handle().clone();

    session.controller.clear_history();

    assert!(handle.is_cancelled());
    assert!(!session.controller.state().is_processing);
    assert!(session.controller.state().is_consistent());
    assert!(!session
        .controller
        .handle_stream_event(stream_id, StreamEvent::Fragment("late".into())));
    assert!(session.controller.view().is_welcome());
}

#[tokio::test]
async fn transients_expire_on_tick() {
    let mut session = create_test_session(Script::stalled(["..."]));
    session.controller.input_changed("one");
    let _job = session.controller.submit().expect("submit");
    let _ = session.controller.submit();
    assert!(session.controller.view().tooltip().is_some());

    let later = Instant::now() + Duration::from_secs(5);
    assert!(session.controller.tick(later));
    assert!(session.controller.view().tooltip().is_none());
    assert!(!session.controller.tick(later));
}

#[tokio::test]
async fn restore_history_rebuilds_transcript() {
    let mut session = create_test_session(Script::ok(["a *b*"]));
    session.controller.input_changed("q");
    let job = session.controller.submit().expect("submit");
    run_job(&mut session.controller, job).await;

    let mut fresh = create_test_session(Script::ok(["unused"]));
    for message in session.controller.history().load() {
        fresh.controller.history().append(message);
    }
    fresh.controller.restore_history();

    let bodies: Vec<String> = fresh
        .controller
        .view()
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            TranscriptEntry::Message(message) => Some(message.body.clone()),
            TranscriptEntry::Pending(_) => None,
        })
        .collect();
    assert_eq!(bodies, vec!["q", "a <em>b</em>"]);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_request() {
    let mut session = create_test_session(Script::stalled(["..."]));
    session.controller.input_changed("bye");
    let job = session.controller.submit().expect("submit");
    let handle = job.handle().clone();

    session.controller.shutdown();

    assert!(handle.is_cancelled());
    assert_eq!(handle.reason(), Some(AbortReason::Cancelled));
    assert!(!session.controller.state().is_processing);
    assert_eq!(last_body(&session.controller), "Error: request aborted");
}
