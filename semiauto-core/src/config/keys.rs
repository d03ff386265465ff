use crate::keyboard::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// Commands that can be bound to keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// No-op: explicitly unbinds a key (removes inherited/default binding)
    Noop,

    // General commands
    Quit,
    QuitIfClosed,

    // Table movement commands
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    MoveTop,
    MoveBottom,

    // Dialog commands
    Confirm,
    Cancel,
    FocusNext,
    FocusPrev,

    // Text-edit commands
    DeleteBackwardChar,
    DeleteBackwardWord,
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorStart,
    MoveCursorEnd,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noop" | "none" | "unbound" => Ok(Command::Noop),
            "quit" => Ok(Command::Quit),
            "quit_if_closed" => Ok(Command::QuitIfClosed),
            "move_up" => Ok(Command::MoveUp),
            "move_down" => Ok(Command::MoveDown),
            "page_up" => Ok(Command::PageUp),
            "page_down" => Ok(Command::PageDown),
            "move_top" => Ok(Command::MoveTop),
            "move_bottom" => Ok(Command::MoveBottom),
            "confirm" => Ok(Command::Confirm),
            "cancel" => Ok(Command::Cancel),
            "focus_next" => Ok(Command::FocusNext),
            "focus_prev" => Ok(Command::FocusPrev),
            "delete_backward_char" => Ok(Command::DeleteBackwardChar),
            "delete_backward_word" => Ok(Command::DeleteBackwardWord),
            "move_cursor_left" => Ok(Command::MoveCursorLeft),
            "move_cursor_right" => Ok(Command::MoveCursorRight),
            "move_cursor_start" => Ok(Command::MoveCursorStart),
            "move_cursor_end" => Ok(Command::MoveCursorEnd),
            _ => Err(format!("Unknown command: {s}")),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Command::Noop => "noop",
            Command::Quit => "quit",
            Command::QuitIfClosed => "quit_if_closed",
            Command::MoveUp => "move_up",
            Command::MoveDown => "move_down",
            Command::PageUp => "page_up",
            Command::PageDown => "page_down",
            Command::MoveTop => "move_top",
            Command::MoveBottom => "move_bottom",
            Command::Confirm => "confirm",
            Command::Cancel => "cancel",
            Command::FocusNext => "focus_next",
            Command::FocusPrev => "focus_prev",
            Command::DeleteBackwardChar => "delete_backward_char",
            Command::DeleteBackwardWord => "delete_backward_word",
            Command::MoveCursorLeft => "move_cursor_left",
            Command::MoveCursorRight => "move_cursor_right",
            Command::MoveCursorStart => "move_cursor_start",
            Command::MoveCursorEnd => "move_cursor_end",
        };
        write!(f, "{s}")
    }
}

impl Command {
    /// Short label for the hint line
    pub fn description(&self) -> &'static str {
        match self {
            Command::Noop => "unbound",
            Command::Quit => "quit",
            Command::QuitIfClosed => "quit when finished",
            Command::MoveUp => "up",
            Command::MoveDown => "down",
            Command::PageUp => "page up",
            Command::PageDown => "page down",
            Command::MoveTop => "top",
            Command::MoveBottom => "bottom",
            Command::Confirm => "confirm",
            Command::Cancel => "cancel",
            Command::FocusNext => "next control",
            Command::FocusPrev => "previous control",
            Command::DeleteBackwardChar => "delete char",
            Command::DeleteBackwardWord => "delete word",
            Command::MoveCursorLeft => "cursor left",
            Command::MoveCursorRight => "cursor right",
            Command::MoveCursorStart => "cursor to start",
            Command::MoveCursorEnd => "cursor to end",
        }
    }
}

/// Key bindings for a specific layer
pub type KeyMap = HashMap<KeyEvent, Command>;

/// What currently has the operator's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// No dialog; keys scroll the table.
    TestList,
    /// A dialog is open and one of its buttons has focus.
    Dialog,
    /// A prompt dialog is open with its text field focused.
    DialogInput,
}

/// Complete key binding configuration, composed from reusable layers.
#[derive(Debug, Clone)]
pub struct KeysConfig {
    pub general: KeyMap,
    pub list_navigation: KeyMap,
    pub dialog: KeyMap,
    pub text_edit: KeyMap,
}

/// Intermediate structure for deserializing key bindings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeysConfigRaw {
    #[serde(default)]
    general: HashMap<String, String>,
    #[serde(default)]
    list_navigation: HashMap<String, String>,
    #[serde(default)]
    dialog: HashMap<String, String>,
    #[serde(default)]
    text_edit: HashMap<String, String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl KeysConfig {
    pub fn new() -> Self {
        Self {
            general: Self::default_general(),
            list_navigation: Self::default_list_navigation(),
            dialog: Self::default_dialog(),
            text_edit: Self::default_text_edit(),
        }
    }

    /// Build the effective keymap for a context using precedence:
    /// general < dialog < text_edit
    pub fn keymap_for_context(&self, context: KeyContext) -> KeyMap {
        let mut combined = KeyMap::new();
        Self::apply_layer(&mut combined, &self.general);

        match context {
            KeyContext::TestList => {
                Self::apply_layer(&mut combined, &self.list_navigation);
            }
            KeyContext::Dialog => {
                Self::apply_layer(&mut combined, &self.dialog);
            }
            KeyContext::DialogInput => {
                Self::apply_layer(&mut combined, &self.dialog);
                Self::apply_layer(&mut combined, &self.text_edit);
            }
        }

        combined
    }

    /// Find the first key bound to a given command in a keymap.
    pub fn find_key(keymap: &KeyMap, command: &Command) -> Option<KeyEvent> {
        let mut found: Vec<_> = keymap
            .iter()
            .filter(|(_, cmd)| *cmd == command)
            .map(|(key, _)| *key)
            .collect();
        found.sort();
        found.into_iter().next()
    }

    fn apply_layer(base: &mut KeyMap, layer: &KeyMap) {
        for (key, command) in layer {
            if *command == Command::Noop {
                base.remove(key);
            } else {
                base.insert(*key, command.clone());
            }
        }
    }

    fn default_general() -> KeyMap {
        let mut map = KeyMap::new();
        map.insert(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Command::Quit,
        );
        map
    }

    fn default_list_navigation() -> KeyMap {
        let mut map = KeyMap::new();
        map.insert(KeyEvent::plain(KeyCode::Up), Command::MoveUp);
        map.insert(KeyEvent::plain(KeyCode::Down), Command::MoveDown);
        map.insert(
            KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL),
            Command::MoveUp,
        );
        map.insert(
            KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL),
            Command::MoveDown,
        );
        map.insert(KeyEvent::plain(KeyCode::PageUp), Command::PageUp);
        map.insert(KeyEvent::plain(KeyCode::PageDown), Command::PageDown);
        map.insert(KeyEvent::plain(KeyCode::Home), Command::MoveTop);
        map.insert(KeyEvent::plain(KeyCode::End), Command::MoveBottom);
        map.insert(KeyEvent::plain(KeyCode::Char('q')), Command::QuitIfClosed);
        map
    }

    fn default_dialog() -> KeyMap {
        let mut map = KeyMap::new();
        map.insert(KeyEvent::plain(KeyCode::Enter), Command::Confirm);
        map.insert(KeyEvent::plain(KeyCode::Esc), Command::Cancel);
        map.insert(KeyEvent::plain(KeyCode::Tab), Command::FocusNext);
        map.insert(KeyEvent::plain(KeyCode::BackTab), Command::FocusPrev);
        map.insert(
            KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Command::FocusPrev,
        );
        map.insert(KeyEvent::plain(KeyCode::Left), Command::FocusPrev);
        map.insert(KeyEvent::plain(KeyCode::Right), Command::FocusNext);
        map
    }

    fn default_text_edit() -> KeyMap {
        let mut map = KeyMap::new();
        map.insert(
            KeyEvent::plain(KeyCode::Backspace),
            Command::DeleteBackwardChar,
        );
        map.insert(
            KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL),
            Command::DeleteBackwardWord,
        );
        map.insert(
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT),
            Command::DeleteBackwardWord,
        );
        map.insert(KeyEvent::plain(KeyCode::Left), Command::MoveCursorLeft);
        map.insert(KeyEvent::plain(KeyCode::Right), Command::MoveCursorRight);
        map.insert(KeyEvent::plain(KeyCode::Home), Command::MoveCursorStart);
        map.insert(KeyEvent::plain(KeyCode::End), Command::MoveCursorEnd);
        map.insert(
            KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL),
            Command::MoveCursorStart,
        );
        map.insert(
            KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL),
            Command::MoveCursorEnd,
        );
        map
    }

    /// Parse a string representation of keybindings into a `KeyMap`
    fn parse_keymap(raw_map: &HashMap<String, String>) -> Result<KeyMap, String> {
        let mut keymap = KeyMap::new();
        for (key_str, command_str) in raw_map {
            let key_event =
                KeyEvent::from_str(key_str).map_err(|e| format!("Invalid key '{key_str}': {e}"))?;
            let command = Command::from_str(command_str)
                .map_err(|e| format!("Invalid command '{command_str}': {e}"))?;
            keymap.insert(key_event, command);
        }
        Ok(keymap)
    }

    /// Merge user configuration with defaults.
    ///
    /// `Noop` values are kept so higher-precedence layers can unbind inherited mappings.
    fn from_raw(raw: &KeysConfigRaw) -> Result<Self, String> {
        let mut config = Self::default();
        config.general.extend(Self::parse_keymap(&raw.general)?);
        config
            .list_navigation
            .extend(Self::parse_keymap(&raw.list_navigation)?);
        config.dialog.extend(Self::parse_keymap(&raw.dialog)?);
        config.text_edit.extend(Self::parse_keymap(&raw.text_edit)?);
        Ok(config)
    }
}

impl<'de> Deserialize<'de> for KeysConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = KeysConfigRaw::deserialize(deserializer)?;
        KeysConfig::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}
