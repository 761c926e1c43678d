//! Terminal event loop for the chat screen.
//!
//! The loop owns the session controller and is the only task that mutates
//! it. Three sources feed it through `tokio::select!`: terminal events from
//! a reader task, `(StreamEvent, stream_id)` pairs from stream jobs, and a
//! frame ticker that expires transients and animates the typing indicator.

pub mod keybindings;
pub mod lifecycle;

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::backend::Backend;
use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tui_textarea::{CursorMove, Input as TAInput, TextArea};

use crate::core::chat_stream::{ChatStreamService, StreamEvent};
use crate::core::session::{ChatSessionController, TranscriptEntry};
use crate::core::storage::KeyValueStore;
use crate::ui::overlays::Overlay;
use crate::ui::renderer::{style_textarea, ui, UiState};
use crate::ui::theme::{save_mode, Theme};

use keybindings::{resolve_key, KeyAction};
use lifecycle::{restore_terminal, setup_terminal};

const MAX_FPS: u64 = 30;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

fn editor_with(text: &str) -> TextArea<'static> {
    let mut textarea = TextArea::from(text.split('\n').map(str::to_string));
    textarea.move_cursor(CursorMove::Bottom);
    textarea.move_cursor(CursorMove::End);
    textarea
}

/// Everything the loop mutates between frames.
pub struct ChatLoop {
    controller: ChatSessionController,
    textarea: TextArea<'static>,
    ui: UiState,
    store: Arc<dyn KeyValueStore>,
    streams: ChatStreamService,
    seen_input_revision: u64,
    page_lines: u16,
}

impl ChatLoop {
    pub fn new(
        controller: ChatSessionController,
        ui: UiState,
        store: Arc<dyn KeyValueStore>,
        streams: ChatStreamService,
    ) -> Self {
        let seen_input_revision = controller.view().input_revision();
        let textarea = editor_with(controller.view().input());
        Self {
            controller,
            textarea,
            ui,
            store,
            streams,
            seen_input_revision,
            page_lines: 10,
        }
    }

    pub fn controller(&self) -> &ChatSessionController {
        &self.controller
    }

    pub fn overlay(&self) -> Overlay {
        self.ui.overlay
    }

    pub fn theme(&self) -> &Theme {
        &self.ui.theme
    }

    pub fn editor_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Returns true when the user asked to quit.
    pub fn handle_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                let sanitized = sanitize_pasted_text(&text);
                if !sanitized.is_empty() && !self.ui.overlay.is_open() {
                    self.textarea.insert_str(sanitized);
                    self.editor_changed();
                }
                false
            }
            UiEvent::Crossterm(_) => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = resolve_key(&key, self.ui.overlay) else {
            return false;
        };

        match action {
            KeyAction::Quit => {
                self.controller.shutdown();
                return true;
            }
            KeyAction::Submit => self.submit(),
            KeyAction::InsertNewline => {
                self.textarea.insert_newline();
                self.editor_changed();
            }
            KeyAction::ToggleHelp => self.ui.overlay = self.ui.overlay.toggle_help(),
            KeyAction::ToggleTheme => self.toggle_theme(),
            KeyAction::RequestClear => self.ui.overlay = Overlay::ConfirmClear,
            KeyAction::ConfirmClear => {
                self.ui.overlay = Overlay::None;
                self.controller.clear_history();
            }
            KeyAction::CloseOverlay => self.ui.overlay = Overlay::None,
            KeyAction::PageUp => self.controller.view_mut().scroll_up(self.page_lines),
            KeyAction::PageDown => self.controller.view_mut().scroll_down(self.page_lines),
            KeyAction::Edit => {
                if self.textarea.input(TAInput::from(key)) {
                    self.editor_changed();
                }
            }
        }
        self.sync_editor_from_view();
        false
    }

    pub fn handle_stream_event(&mut self, stream_id: u64, event: StreamEvent) -> bool {
        let changed = self.controller.handle_stream_event(stream_id, event);
        self.sync_editor_from_view();
        changed
    }

    /// Expires transients; true when a redraw is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.controller.tick(now) || self.is_animating()
    }

    fn is_animating(&self) -> bool {
        self.controller.view().entries().iter().any(|entry| {
            matches!(entry, TranscriptEntry::Pending(placeholder) if placeholder.is_waiting())
        })
    }

    fn submit(&mut self) {
        if let Ok(job) = self.controller.submit() {
            self.streams.spawn_stream(job);
        }
    }

    fn editor_changed(&mut self) {
        let text = self.editor_text();
        self.controller.input_changed(text);
    }

    /// Reloads the editor after the controller rewrote the input.
    fn sync_editor_from_view(&mut self) {
        let revision = self.controller.view().input_revision();
        if revision != self.seen_input_revision {
            self.seen_input_revision = revision;
            self.textarea = editor_with(self.controller.view().input());
        }
    }

    fn toggle_theme(&mut self) {
        let mode = self.ui.theme.mode.toggled();
        debug!(theme = %mode, "switching theme");
        self.ui.theme = Theme::for_mode(mode);
        save_mode(self.store.as_ref(), mode);
    }

    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> std::io::Result<()> {
        style_textarea(&mut self.textarea, &self.controller, &self.ui.theme);
        let now = Instant::now();
        let mut max_back = 0;
        let frame = terminal.draw(|f| {
            max_back = ui(f, &self.controller, &self.textarea, &self.ui, now);
        })?;
        self.page_lines = frame.area.height.saturating_sub(6).max(1);
        self.controller.view_mut().clamp_scroll(max_back);
        Ok(())
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(
    controller: ChatSessionController,
    ui_state: UiState,
    store: Arc<dyn KeyValueStore>,
) -> Result<(), Box<dyn Error>> {
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let mut chat = ChatLoop::new(controller, ui_state, store, stream_service);

    info!(endpoint = chat.controller().endpoint(), "starting chat session");
    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let mut ticker = tokio::time::interval(Duration::from_millis(1000 / MAX_FPS));
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = loop {
        if request_redraw {
            if let Err(err) = chat.draw(&mut terminal) {
                break Err(err.into());
            }
            request_redraw = false;
        }

        tokio::select! {
            Some(event) = event_rx.recv() => {
                if chat.handle_event(event) {
                    break Ok(());
                }
                request_redraw = true;
            }
            Some((event, stream_id)) = stream_rx.recv() => {
                request_redraw |= chat.handle_stream_event(stream_id, event);
            }
            _ = ticker.tick() => {
                request_redraw |= chat.tick(Instant::now());
            }
        }
    };

    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("chat session ended");
    result
}
