//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') if no_mod => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::SoftDrop,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::HardDrop,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_agree() {
        assert_eq!(key_to_action(press(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Char('h'))), Action::MoveLeft);
        assert_eq!(key_to_action(press(KeyCode::Right)), Action::MoveRight);
        assert_eq!(key_to_action(press(KeyCode::Char('l'))), Action::MoveRight);
        assert_eq!(key_to_action(press(KeyCode::Up)), Action::Rotate);
        assert_eq!(key_to_action(press(KeyCode::Char('k'))), Action::Rotate);
        assert_eq!(key_to_action(press(KeyCode::Down)), Action::SoftDrop);
        assert_eq!(key_to_action(press(KeyCode::Char('j'))), Action::SoftDrop);
    }

    #[test]
    fn drop_pause_restart_quit() {
        assert_eq!(key_to_action(press(KeyCode::Char(' '))), Action::HardDrop);
        assert_eq!(key_to_action(press(KeyCode::Enter)), Action::HardDrop);
        assert_eq!(key_to_action(press(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(press(KeyCode::Char('r'))), Action::Restart);
        assert_eq!(key_to_action(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Esc)), Action::Quit);
    }

    #[test]
    fn ctrl_c_quits_other_modifiers_ignored() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_h), Action::None);
    }

    #[test]
    fn unbound_keys_map_to_none() {
        assert_eq!(key_to_action(press(KeyCode::Char('x'))), Action::None);
        assert_eq!(key_to_action(press(KeyCode::Tab)), Action::None);
    }
}
