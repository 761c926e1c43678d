//! Modal overlays drawn above the chat: the help popup and the
//! clear-history confirmation.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Help,
    ConfirmClear,
}

impl Overlay {
    /// F1 opens help from anywhere and closes it again.
    pub fn toggle_help(self) -> Self {
        match self {
            Overlay::Help => Overlay::None,
            _ => Overlay::Help,
        }
    }

    pub fn is_open(self) -> bool {
        self != Overlay::None
    }
}

pub const HELP_ENTRIES: &[(&str, &str)] = &[
    ("Enter", "Send message"),
    ("Alt+Enter", "Insert a new line"),
    ("PageUp / PageDown", "Scroll the conversation"),
    ("Ctrl+L", "Clear chat history"),
    ("F2 / Ctrl+T", "Switch between dark and light theme"),
    ("F1", "Show or hide this help"),
    ("Ctrl+C", "Quit"),
];

const CONFIRM_TEXT: &str = "Clear the whole chat history?";
const CONFIRM_KEYS: &str = "y / Enter: clear    n / Esc: keep";

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

pub fn render_overlay(f: &mut Frame, overlay: Overlay, theme: &Theme) {
    match overlay {
        Overlay::None => {}
        Overlay::Help => render_help(f, theme),
        Overlay::ConfirmClear => render_confirm_clear(f, theme),
    }
}

fn help_lines(theme: &Theme) -> Vec<Line<'static>> {
    let key_width = HELP_ENTRIES
        .iter()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0);
    HELP_ENTRIES
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(
                    format!("{key:<key_width$}  "),
                    theme.assistant_text_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(*action, theme.assistant_text_style),
            ])
        })
        .collect()
}

fn render_help(f: &mut Frame, theme: &Theme) {
    let lines = help_lines(theme);
    let area = popup_area(f.area(), 56, lines.len() as u16 + 2);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.popup_border_style)
        .title(" Help (F1 or Esc to close) ")
        .style(Style::default().bg(theme.background_color));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm_clear(f: &mut Frame, theme: &Theme) {
    let area = popup_area(f.area(), 44, 5);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.popup_border_style)
        .title(" Clear history ")
        .style(Style::default().bg(theme.background_color));
    let body = vec![
        Line::from(Span::styled(CONFIRM_TEXT, theme.assistant_text_style)),
        Line::from(""),
        Line::from(Span::styled(CONFIRM_KEYS, theme.input_hint_style)),
    ];
    f.render_widget(
        Paragraph::new(body)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_toggles() {
        let overlay = Overlay::None.toggle_help();
        assert_eq!(overlay, Overlay::Help);
        assert_eq!(overlay.toggle_help(), Overlay::None);
        assert_eq!(Overlay::ConfirmClear.toggle_help(), Overlay::Help);
        assert!(!Overlay::None.is_open());
    }

    #[test]
    fn popup_stays_inside_small_frames() {
        let area = Rect::new(0, 0, 30, 6);
        let popup = popup_area(area, 56, 9);
        assert!(popup.right() <= area.right());
        assert!(popup.bottom() <= area.bottom());
        assert_eq!(popup.width, 26);
    }

    #[test]
    fn help_lists_every_binding() {
        let lines = help_lines(&Theme::dark());
        assert_eq!(lines.len(), HELP_ENTRIES.len());
    }
}
