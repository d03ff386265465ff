use semiauto_core::{
    config::{
        KeysConfig,
        keys::{Command, KeyContext},
    },
    dialog::TextEdit,
    keyboard::{KeyCode, KeyEvent, KeyModifiers},
    session::{KeyInput, Session},
    transport::Transport,
};

/// A key press after lookup in the active keymap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Unbound, unmodified character. Handed to the session, which either
    /// types it into the prompt field or looks it up in the dialog bindings.
    Char(char),
}

pub fn key_context<T: Transport>(session: &Session<T>) -> KeyContext {
    match session.dialog() {
        Some(dialog) if dialog.input_has_focus() => KeyContext::DialogInput,
        Some(_) => KeyContext::Dialog,
        None => KeyContext::TestList,
    }
}

/// Resolve a terminal key event against the keymap for `context`
pub fn resolve_input(
    key: &crossterm::event::KeyEvent,
    context: KeyContext,
    keys: &KeysConfig,
) -> Option<Input> {
    let event = KeyEvent::from_crossterm(key)?;
    let keymap = keys.keymap_for_context(context);
    if let Some(command) = keymap.get(&event) {
        return Some(Input::Command(command.clone()));
    }
    match event.code {
        KeyCode::Char(c) if event.modifiers == KeyModifiers::NONE => Some(Input::Char(c)),
        _ => None,
    }
}

/// Session input for commands that act on the open dialog.
pub fn dialog_input(command: &Command) -> Option<KeyInput> {
    let input = match command {
        Command::Confirm => KeyInput::Activate,
        Command::Cancel => KeyInput::Cancel,
        Command::FocusNext => KeyInput::FocusNext,
        Command::FocusPrev => KeyInput::FocusPrev,
        Command::DeleteBackwardChar => KeyInput::Edit(TextEdit::DeleteBackwardChar),
        Command::DeleteBackwardWord => KeyInput::Edit(TextEdit::DeleteBackwardWord),
        Command::MoveCursorLeft => KeyInput::Edit(TextEdit::CursorLeft),
        Command::MoveCursorRight => KeyInput::Edit(TextEdit::CursorRight),
        Command::MoveCursorStart => KeyInput::Edit(TextEdit::CursorStart),
        Command::MoveCursorEnd => KeyInput::Edit(TextEdit::CursorEnd),
        _ => return None,
    };
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode as CtCode, KeyEvent as CtEvent, KeyModifiers as CtMods};
    use semiauto_core::config::DialectSetting;
    use semiauto_core::event::TransportEvent;
    use semiauto_core::transport::MemoryTransport;

    fn key(code: CtCode) -> CtEvent {
        CtEvent::new(code, CtMods::NONE)
    }

    #[test]
    fn test_context_follows_dialog_focus() {
        let mut session = Session::new(MemoryTransport::default(), DialectSetting::Auto);
        session.connect();
        assert_eq!(key_context(&session), KeyContext::TestList);

        session.handle_event(TransportEvent::Message(r#"{"prompt":"IMEI?"}"#.to_string()));
        assert_eq!(key_context(&session), KeyContext::DialogInput);

        session.handle_key(KeyInput::FocusNext);
        assert_eq!(key_context(&session), KeyContext::Dialog);
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let keys = KeysConfig::default();
        let ctrl_c = CtEvent::new(CtCode::Char('c'), CtMods::CONTROL);
        for context in [
            KeyContext::TestList,
            KeyContext::Dialog,
            KeyContext::DialogInput,
        ] {
            assert_eq!(
                resolve_input(&ctrl_c, context, &keys),
                Some(Input::Command(Command::Quit))
            );
        }
    }

    #[test]
    fn test_plain_chars_pass_through() {
        let keys = KeysConfig::default();
        assert_eq!(
            resolve_input(&key(CtCode::Char('y')), KeyContext::Dialog, &keys),
            Some(Input::Char('y'))
        );
        assert_eq!(
            resolve_input(&key(CtCode::Char('q')), KeyContext::DialogInput, &keys),
            Some(Input::Char('q'))
        );
        let shifted = CtEvent::new(CtCode::Char('Y'), CtMods::SHIFT);
        assert_eq!(
            resolve_input(&shifted, KeyContext::DialogInput, &keys),
            Some(Input::Char('Y'))
        );
    }

    #[test]
    fn test_modified_unbound_keys_are_dropped() {
        let keys = KeysConfig::default();
        let alt_x = CtEvent::new(CtCode::Char('x'), CtMods::ALT);
        assert_eq!(resolve_input(&alt_x, KeyContext::Dialog, &keys), None);
        assert_eq!(resolve_input(&key(CtCode::F(1)), KeyContext::TestList, &keys), None);
    }

    #[test]
    fn test_table_keys() {
        let keys = KeysConfig::default();
        assert_eq!(
            resolve_input(&key(CtCode::PageDown), KeyContext::TestList, &keys),
            Some(Input::Command(Command::PageDown))
        );
        assert_eq!(
            resolve_input(&key(CtCode::Char('q')), KeyContext::TestList, &keys),
            Some(Input::Command(Command::QuitIfClosed))
        );
    }

    #[test]
    fn test_dialog_input_mapping() {
        assert_eq!(dialog_input(&Command::Confirm), Some(KeyInput::Activate));
        assert_eq!(
            dialog_input(&Command::DeleteBackwardWord),
            Some(KeyInput::Edit(TextEdit::DeleteBackwardWord))
        );
        assert_eq!(dialog_input(&Command::PageDown), None);
        assert_eq!(dialog_input(&Command::Quit), None);
    }
}
