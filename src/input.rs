//! Keyboard bindings for the interactive session.
//!
//! - Space / `c`: capture a still from the preview
//! - `s` / Enter: save the captured still
//! - `n` / Tab: switch to the next camera
//! - `q` / Esc / Ctrl+C: quit

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::SessionAction;

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Session(SessionAction),
    Quit,
    /// Key has no binding
    None,
}

pub fn handle_key_event(event: KeyEvent) -> KeyAction {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    // Windows reports releases too
    if kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Quit,
            _ => KeyAction::None,
        };
    }

    match code {
        KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Char('C') => {
            KeyAction::Session(SessionAction::Capture)
        }
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Enter => {
            KeyAction::Session(SessionAction::Save)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Tab => {
            KeyAction::Session(SessionAction::SwitchCamera)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::None,
    }
}
