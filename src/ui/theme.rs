use std::fmt;

use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

use crate::core::storage::KeyValueStore;

/// Store key holding the persisted theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the starting mode: stored preference first, then the configured
/// default, then the desktop hint.
pub fn initial_mode(
    store: &dyn KeyValueStore,
    configured: Option<&str>,
    system: Option<ThemeMode>,
) -> ThemeMode {
    let stored = match store.get(THEME_KEY) {
        Ok(value) => value.as_deref().and_then(ThemeMode::parse),
        Err(err) => {
            warn!(error = %err, "failed to read theme preference");
            None
        }
    };

    stored
        .or_else(|| configured.and_then(ThemeMode::parse))
        .or(system)
        .unwrap_or_default()
}

pub fn save_mode(store: &dyn KeyValueStore, mode: ThemeMode) {
    if let Err(err) = store.set(THEME_KEY, mode.as_str()) {
        warn!(error = %err, "failed to save theme preference");
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Transcript
    pub user_label_style: Style,
    pub user_text_style: Style,
    pub assistant_label_style: Style,
    pub assistant_text_style: Style,
    pub error_text_style: Style,
    pub link_style: Style,
    pub timestamp_style: Style,
    pub welcome_style: Style,
    pub typing_indicator_style: Style,

    // Chrome
    pub title_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub tooltip_style: Style,
    pub notification_style: Style,
    pub popup_border_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_hint_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Theme {
            mode: ThemeMode::Dark,
            background_color: Color::Black,
            user_label_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_label_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            error_text_style: Style::default().fg(Color::LightRed),
            link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            timestamp_style: Style::default().fg(Color::DarkGray),
            welcome_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            typing_indicator_style: Style::default().fg(Color::Gray),

            title_style: Style::default().fg(Color::Gray),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            tooltip_style: Style::default().fg(Color::Black).bg(Color::Yellow),
            notification_style: Style::default().fg(Color::Black).bg(Color::Green),
            popup_border_style: Style::default().fg(Color::Cyan),

            input_text_style: Style::default().fg(Color::White),
            input_hint_style: Style::default().fg(Color::DarkGray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            mode: ThemeMode::Light,
            background_color: Color::White,
            user_label_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_label_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Black),
            error_text_style: Style::default().fg(Color::Red),
            link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            timestamp_style: Style::default().fg(Color::Gray),
            welcome_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            typing_indicator_style: Style::default().fg(Color::DarkGray),

            title_style: Style::default().fg(Color::DarkGray),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),
            tooltip_style: Style::default().fg(Color::Black).bg(Color::LightYellow),
            notification_style: Style::default().fg(Color::Black).bg(Color::LightGreen),
            popup_border_style: Style::default().fg(Color::Blue),

            input_text_style: Style::default().fg(Color::Black),
            input_hint_style: Style::default().fg(Color::Gray),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }
}
