//! Terminal UI layer for the chat client.
//!
//! Key submodules:
//! - [`chat_loop`]: the event loop that owns the session controller and
//!   feeds it keys, stream events and clock ticks.
//! - [`renderer`], [`markup`] and [`wrap`]: pure rendering of the session's
//!   view model into a frame.
//! - [`theme`] and [`appearance`]: dark and light palettes, the persisted
//!   preference and the desktop hint used when none is stored.
//! - [`overlays`] and [`typing`]: help and confirmation popups, and the
//!   "thinking" indicator.
//!
//! Ownership boundary: this layer presents and captures interaction state,
//! while [`crate::core`] owns session logic and backend coordination.

pub mod appearance;
pub mod chat_loop;
pub mod markup;
pub mod overlays;
pub mod renderer;
pub mod theme;
pub mod typing;
pub mod wrap;
