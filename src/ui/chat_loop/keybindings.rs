//! Key routing.
//!
//! Global chords map to [`AppAction`]s regardless of focus; everything else
//! goes to whichever editor currently has focus.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input as TAInput;

use crate::core::app::{AppAction, Focus};

/// What the event loop should do with a key press.
pub enum KeyRoute {
    Dispatch(AppAction),
    /// Take the input text now and queue it for sending.
    Submit,
    /// Feed the key to the message input.
    EditInput,
    InsertNewline,
    /// Feed the key to the focused configuration field.
    EditField,
}

pub fn resolve_key(focus: Focus, key: &KeyEvent) -> KeyRoute {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        let action = match key.code {
            KeyCode::Char('c') => Some(AppAction::Quit),
            KeyCode::Char('r') => Some(AppAction::RestartChat),
            KeyCode::Char('y') => Some(AppAction::CopyLastReply),
            KeyCode::Char('o') => Some(AppAction::ToggleSidebar),
            _ => None,
        };
        if let Some(action) = action {
            return KeyRoute::Dispatch(action);
        }
    }

    match key.code {
        KeyCode::Esc => return KeyRoute::Dispatch(AppAction::CloseSidebar),
        KeyCode::Tab => return KeyRoute::Dispatch(AppAction::CycleFocus { forward: true }),
        KeyCode::BackTab => return KeyRoute::Dispatch(AppAction::CycleFocus { forward: false }),
        KeyCode::PageUp => return KeyRoute::Dispatch(AppAction::ScrollPageUp),
        KeyCode::PageDown => return KeyRoute::Dispatch(AppAction::ScrollPageDown),
        _ => {}
    }

    if focus.is_config_field() {
        return KeyRoute::EditField;
    }

    match key.code {
        KeyCode::Enter
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            KeyRoute::InsertNewline
        }
        KeyCode::Enter => KeyRoute::Submit,
        KeyCode::Home if ctrl => KeyRoute::Dispatch(AppAction::ScrollToTop),
        KeyCode::End if ctrl => KeyRoute::Dispatch(AppAction::ScrollToBottom),
        _ => KeyRoute::EditInput,
    }
}

/// Plain Home/End scroll the log while the input is empty; otherwise they
/// move the cursor.
pub fn scroll_for_empty_input(key: &KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Home => Some(AppAction::ScrollToTop),
        KeyCode::End => Some(AppAction::ScrollToBottom),
        _ => None,
    }
}

pub fn to_textarea_input(key: KeyEvent) -> TAInput {
    TAInput::from(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn enter_submits_and_shift_enter_inserts_newline() {
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::Enter, KeyModifiers::NONE)),
            KeyRoute::Submit
        ));
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::Enter, KeyModifiers::SHIFT)),
            KeyRoute::InsertNewline
        ));
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::Enter, KeyModifiers::ALT)),
            KeyRoute::InsertNewline
        ));
    }

    #[test]
    fn enter_in_a_config_field_does_not_submit() {
        assert!(matches!(
            resolve_key(Focus::Instruction, &press(KeyCode::Enter, KeyModifiers::NONE)),
            KeyRoute::EditField
        ));
    }

    #[test]
    fn global_chords_work_from_any_focus() {
        for focus in [Focus::Input, Focus::Name, Focus::Model, Focus::Instruction] {
            assert!(matches!(
                resolve_key(focus, &press(KeyCode::Char('r'), KeyModifiers::CONTROL)),
                KeyRoute::Dispatch(AppAction::RestartChat)
            ));
            assert!(matches!(
                resolve_key(focus, &press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
                KeyRoute::Dispatch(AppAction::Quit)
            ));
            assert!(matches!(
                resolve_key(focus, &press(KeyCode::BackTab, KeyModifiers::SHIFT)),
                KeyRoute::Dispatch(AppAction::CycleFocus { forward: false })
            ));
        }
    }

    #[test]
    fn plain_characters_edit_the_focused_editor() {
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::Char('a'), KeyModifiers::NONE)),
            KeyRoute::EditInput
        ));
        assert!(matches!(
            resolve_key(Focus::Name, &press(KeyCode::Char('a'), KeyModifiers::NONE)),
            KeyRoute::EditField
        ));
    }

    #[test]
    fn ctrl_home_and_end_scroll_the_log() {
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::Home, KeyModifiers::CONTROL)),
            KeyRoute::Dispatch(AppAction::ScrollToTop)
        ));
        assert!(matches!(
            resolve_key(Focus::Input, &press(KeyCode::End, KeyModifiers::CONTROL)),
            KeyRoute::Dispatch(AppAction::ScrollToBottom)
        ));
        assert!(scroll_for_empty_input(&press(KeyCode::Char('x'), KeyModifiers::NONE)).is_none());
    }
}
