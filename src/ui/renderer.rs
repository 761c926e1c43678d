use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::core::session::{
    ChatSessionController, EntryKind, TranscriptEntry, ViewModel, WELCOME_TEXT,
};
use crate::ui::markup::{markup_to_lines, plain_to_lines, MarkupStyles};
use crate::ui::overlays::{render_overlay, Overlay};
use crate::ui::theme::Theme;
use crate::ui::typing::TypingIndicator;
use crate::ui::wrap::prewrap_lines;

const MAX_INPUT_LINES: u16 = 5;
const USER_LABEL: &str = "You";
const ASSISTANT_LABEL: &str = "Assistant";

/// Front-end state that is not part of the session: presentation only.
#[derive(Debug, Clone)]
pub struct UiState {
    pub theme: Theme,
    pub overlay: Overlay,
    pub typing: TypingIndicator,
}

fn header_line(
    label: &'static str,
    time_label: &str,
    label_style: Style,
    theme: &Theme,
) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(format!("  {time_label}"), theme.timestamp_style),
    ])
}

fn markup_styles(theme: &Theme, base: Style) -> MarkupStyles {
    MarkupStyles {
        base,
        link: theme.link_style,
        link_target: theme.timestamp_style,
    }
}

/// Flattens the transcript into unwrapped lines, one blank line between
/// entries.
pub fn build_transcript_lines(
    view: &ViewModel,
    theme: &Theme,
    typing: &TypingIndicator,
    now: Instant,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, entry) in view.entries().iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        match entry {
            TranscriptEntry::Message(message) => match message.kind {
                EntryKind::User => {
                    lines.push(header_line(
                        USER_LABEL,
                        &message.time_label,
                        theme.user_label_style,
                        theme,
                    ));
                    lines.extend(plain_to_lines(&message.body, theme.user_text_style));
                }
                EntryKind::Assistant | EntryKind::Error => {
                    let base = if message.kind == EntryKind::Error {
                        theme.error_text_style
                    } else {
                        theme.assistant_text_style
                    };
                    lines.push(header_line(
                        ASSISTANT_LABEL,
                        &message.time_label,
                        theme.assistant_label_style,
                        theme,
                    ));
                    lines.extend(markup_to_lines(&message.body, &markup_styles(theme, base)));
                }
            },
            TranscriptEntry::Pending(placeholder) => {
                lines.push(header_line(
                    ASSISTANT_LABEL,
                    &placeholder.time_label,
                    theme.assistant_label_style,
                    theme,
                ));
                if placeholder.is_waiting() {
                    lines.push(typing.line(
                        placeholder.started_at,
                        now,
                        theme.typing_indicator_style,
                    ));
                } else {
                    lines.extend(markup_to_lines(
                        &placeholder.rendered,
                        &markup_styles(theme, theme.assistant_text_style),
                    ));
                }
            }
        }
    }
    lines
}

/// Returns `(index of the top visible line, largest useful scroll-back)` for
/// a transcript of `total` wrapped lines shown in `height` rows. Scroll-back
/// is counted in `u16` rows, so it saturates on very long transcripts while
/// the bottom stays reachable.
pub fn scroll_window(total: usize, height: u16, scroll_back: u16) -> (usize, u16) {
    let bottom = total.saturating_sub(usize::from(height));
    let back = usize::from(scroll_back).min(bottom);
    let max_back = u16::try_from(bottom).unwrap_or(u16::MAX);
    (bottom - back, max_back)
}

/// Applies session-driven chrome to the editor before a frame is drawn.
pub fn style_textarea(
    textarea: &mut TextArea<'static>,
    controller: &ChatSessionController,
    theme: &Theme,
) {
    let send_style = if controller.can_send() {
        theme.input_title_style
    } else {
        theme.input_hint_style
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(
            " Message (Alt+Enter for new line) ",
            theme.input_title_style,
        ))
        .title(Line::from(Span::styled(" Enter to send ", send_style)).right_aligned());
    textarea.set_block(block);
    textarea.set_style(theme.input_text_style);
    textarea.set_cursor_style(theme.input_cursor_style);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text(controller.input_hint());
    textarea.set_placeholder_style(theme.input_hint_style);
}

fn input_height(textarea: &TextArea<'_>) -> u16 {
    let lines = u16::try_from(textarea.lines().len()).unwrap_or(MAX_INPUT_LINES);
    lines.clamp(1, MAX_INPUT_LINES) + 2
}

fn render_transient(f: &mut Frame, area: Rect, text: &str, style: Style, top: bool) {
    if area.height == 0 {
        return;
    }
    let width = (text.chars().count() as u16 + 2).min(area.width);
    let x = area.x + area.width.saturating_sub(width);
    let y = if top {
        area.y
    } else {
        area.y + area.height.saturating_sub(1)
    };
    let rect = Rect::new(x, y, width, 1);
    f.render_widget(Clear, rect);
    f.render_widget(Paragraph::new(format!(" {text} ")).style(style), rect);
}

/// Draws one frame. Returns the largest scroll-back the transcript allows at
/// this size so the caller can clamp the view model.
pub fn ui(
    f: &mut Frame,
    controller: &ChatSessionController,
    textarea: &TextArea<'static>,
    state: &UiState,
    now: Instant,
) -> u16 {
    let theme = &state.theme;
    let view = controller.view();

    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_height(textarea)),
        ])
        .split(f.area());

    let title = Line::from(vec![
        Span::styled(
            format!(
                "Parley v{} • {}",
                env!("CARGO_PKG_VERSION"),
                controller.endpoint()
            ),
            theme.title_style,
        ),
        Span::styled("  (F1 for help)", theme.timestamp_style),
    ]);
    f.render_widget(Paragraph::new(title), chunks[0]);

    let transcript_area = chunks[1];
    let mut max_back = 0;
    if view.is_welcome() {
        let welcome: Vec<Line> = WELCOME_TEXT
            .lines()
            .map(|line| Line::from(Span::styled(line, theme.welcome_style)))
            .collect();
        let pad = transcript_area.height.saturating_sub(welcome.len() as u16) / 2;
        let area = Rect {
            y: transcript_area.y + pad,
            height: transcript_area.height.saturating_sub(pad),
            ..transcript_area
        };
        f.render_widget(Paragraph::new(welcome).alignment(Alignment::Center), area);
    } else {
        let lines = build_transcript_lines(view, theme, &state.typing, now);
        let wrapped = prewrap_lines(&lines, transcript_area.width);
        let (top, max) =
            scroll_window(wrapped.len(), transcript_area.height, view.scroll_back());
        max_back = max;
        let visible: Vec<Line<'static>> = wrapped
            .into_iter()
            .skip(top)
            .take(usize::from(transcript_area.height))
            .collect();
        f.render_widget(Paragraph::new(visible), transcript_area);
    }

    if let Some(notification) = view.notification() {
        render_transient(
            f,
            transcript_area,
            &notification.text,
            theme.notification_style,
            true,
        );
    }
    if let Some(tooltip) = view.tooltip() {
        render_transient(f, transcript_area, &tooltip.text, theme.tooltip_style, false);
    }

    f.render_widget(textarea, chunks[2]);
    render_overlay(f, state.overlay, theme);
    max_back
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::StreamEvent;
    use crate::core::session::BUSY_WARNING;
    use crate::utils::test_utils::{create_test_session, Script};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn ui_state() -> UiState {
        UiState {
            theme: Theme::dark(),
            overlay: Overlay::None,
            typing: TypingIndicator::new(Duration::from_millis(500)),
        }
    }

    #[test]
    fn scroll_window_pins_to_bottom_and_clamps() {
        assert_eq!(scroll_window(5, 10, 0), (0, 0));
        assert_eq!(scroll_window(30, 10, 0), (20, 20));
        assert_eq!(scroll_window(30, 10, 5), (15, 20));
        assert_eq!(scroll_window(30, 10, 99), (0, 20));
    }

    #[test]
    fn scroll_window_reaches_the_bottom_of_huge_transcripts() {
        let total = 100_000;
        assert_eq!(scroll_window(total, 20, 0), (total - 20, u16::MAX));
        assert_eq!(scroll_window(total, 20, 10), (total - 30, u16::MAX));
    }

    #[tokio::test]
    async fn waiting_placeholder_shows_thinking_then_text() {
        let mut session = create_test_session(Script::stalled(["unused"]));
        session.controller.input_changed("hi");
        let job = session.controller.submit().expect("submit");
        let state = ui_state();
        let now = Instant::now();

        let lines =
            build_transcript_lines(session.controller.view(), &state.theme, &state.typing, now);
        let rendered = texts(&lines);
        assert_eq!(rendered[1], "hi");
        assert!(rendered[4].contains("thinking"));

        session
            .controller
            .handle_stream_event(job.stream_id(), StreamEvent::Fragment("**ok**".into()));
        let lines =
            build_transcript_lines(session.controller.view(), &state.theme, &state.typing, now);
        assert_eq!(texts(&lines)[4], "ok");
    }

    #[tokio::test]
    async fn frame_shows_welcome_and_tooltip() {
        let mut session = create_test_session(Script::stalled(["unused"]));
        let mut textarea = TextArea::default();
        let state = ui_state();
        let mut terminal = Terminal::new(TestBackend::new(60, 14)).expect("terminal");

        style_textarea(&mut textarea, &session.controller, &state.theme);
        terminal
            .draw(|f| {
                ui(f, &session.controller, &textarea, &state, Instant::now());
            })
            .expect("draw");
        let screen = format!("{:?}", terminal.backend().buffer());
        assert!(screen.contains("How can I help you?"));
        assert!(screen.contains("Type your message..."));

        session.controller.input_changed("one");
        let _job = session.controller.submit().expect("submit");
        let _ = session.controller.submit();
        style_textarea(&mut textarea, &session.controller, &state.theme);
        terminal
            .draw(|f| {
                ui(f, &session.controller, &textarea, &state, Instant::now());
            })
            .expect("draw");
        let screen = format!("{:?}", terminal.backend().buffer());
        assert!(screen.contains(BUSY_WARNING));
        assert!(screen.contains("You can keep typing..."));
    }
}
