//! Parley is a terminal chat client for endpoints that stream their replies
//! as a raw chunked text body.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session state machine, the request lifecycle with its
//!   timeout and cancellation, stream decoding, reply formatting and the
//!   persisted history.
//! - [`ui`] renders the transcript and input area and runs the event loop
//!   that feeds terminal events and stream events into the session.
//! - [`api`] defines the request payload posted to the chat endpoint.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which
//! resolves settings and starts [`ui::chat_loop::run_chat`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
