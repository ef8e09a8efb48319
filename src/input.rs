//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the block; restarts when the game is over.
    Lock,
    SpeedUp,
    SpeedDown,
    Quit,
    None,
}

/// Map key event to game action. Arrow keys and vim-style `j`/`k` both adjust speed.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char(' ') | KeyCode::Enter => Action::Lock,
        KeyCode::Char('+' | '=' | 'k') | KeyCode::Up => Action::SpeedUp,
        KeyCode::Char('-' | '_' | 'j') | KeyCode::Down => Action::SpeedDown,
        _ => Action::None,
    }
}

/// Any left click on the terminal locks (or restarts).
pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::Lock,
        _ => Action::None,
    }
}
