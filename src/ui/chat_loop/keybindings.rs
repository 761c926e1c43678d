//! Key resolution for the chat screen.
//!
//! Mapping a key to an action is kept separate from performing it so the
//! bindings can be tested without a terminal.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::overlays::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    InsertNewline,
    ToggleHelp,
    ToggleTheme,
    RequestClear,
    ConfirmClear,
    CloseOverlay,
    PageUp,
    PageDown,
    /// Forwarded to the editor.
    Edit,
}

pub fn resolve_key(key: &KeyEvent, overlay: Overlay) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c')) {
        return Some(KeyAction::Quit);
    }

    match overlay {
        Overlay::ConfirmClear => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                Some(KeyAction::ConfirmClear)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                Some(KeyAction::CloseOverlay)
            }
            _ => None,
        },
        Overlay::Help => match key.code {
            KeyCode::F(1) => Some(KeyAction::ToggleHelp),
            KeyCode::Esc | KeyCode::Enter => Some(KeyAction::CloseOverlay),
            _ => None,
        },
        Overlay::None => Some(match key.code {
            KeyCode::Enter
                if key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
            {
                KeyAction::InsertNewline
            }
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::F(1) => KeyAction::ToggleHelp,
            KeyCode::F(2) => KeyAction::ToggleTheme,
            KeyCode::Char('t') if ctrl => KeyAction::ToggleTheme,
            KeyCode::Char('l') if ctrl => KeyAction::RequestClear,
            KeyCode::PageUp => KeyAction::PageUp,
            KeyCode::PageDown => KeyAction::PageDown,
            _ => KeyAction::Edit,
        }),
    }
}
