use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct KeyModifiers: u8 {
        const NONE = 0;
        const SHIFT = 1;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// Terminal-independent key code. Only the keys the client binds are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Shift is implied by the character itself, so it is dropped for `Char` keys.
    /// This lets `G` in a config file match the event a terminal reports for shift+g.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self::new(self.code, self.modifiers - KeyModifiers::SHIFT),
            _ => self,
        }
    }
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("enter", KeyCode::Enter),
    ("esc", KeyCode::Esc),
    ("tab", KeyCode::Tab),
    ("backtab", KeyCode::BackTab),
    ("backspace", KeyCode::Backspace),
    ("delete", KeyCode::Delete),
    ("up", KeyCode::Up),
    ("down", KeyCode::Down),
    ("left", KeyCode::Left),
    ("right", KeyCode::Right),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("pageup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("space", KeyCode::Char(' ')),
];

impl FromStr for KeyEvent {
    type Err = String;

    /// Parses `C-c`, `A-g`, `S-tab`, `enter`, `q` and combinations such as `C-A-x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty key".to_string());
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut rest = s;
        while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
            let flag = match &rest[..1] {
                "C" => KeyModifiers::CONTROL,
                "A" | "M" => KeyModifiers::ALT,
                "S" => KeyModifiers::SHIFT,
                other => return Err(format!("unknown modifier '{other}'")),
            };
            modifiers |= flag;
            rest = &rest[2..];
        }

        let lower = rest.to_ascii_lowercase();
        if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == lower) {
            return Ok(Self::new(*code, modifiers));
        }

        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self::new(KeyCode::Char(c), modifiers)),
            _ => Err(format!("unknown key '{rest}'")),
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("A-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("S-")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            code => {
                let name = NAMED_KEYS
                    .iter()
                    .find(|(_, named)| *named == code)
                    .map_or("?", |(name, _)| *name);
                f.write_str(name)
            }
        }
    }
}

impl KeyEvent {
    /// Convert a crossterm event. Keys the client never binds (function keys,
    /// media keys, ...) yield `None`.
    pub fn from_crossterm(event: &crossterm::event::KeyEvent) -> Option<Self> {
        use crossterm::event::{KeyCode as Ct, KeyModifiers as CtMods};

        let code = match event.code {
            Ct::Char(c) => KeyCode::Char(c),
            Ct::Enter => KeyCode::Enter,
            Ct::Esc => KeyCode::Esc,
            Ct::Tab => KeyCode::Tab,
            Ct::BackTab => KeyCode::BackTab,
            Ct::Backspace => KeyCode::Backspace,
            Ct::Delete => KeyCode::Delete,
            Ct::Up => KeyCode::Up,
            Ct::Down => KeyCode::Down,
            Ct::Left => KeyCode::Left,
            Ct::Right => KeyCode::Right,
            Ct::Home => KeyCode::Home,
            Ct::End => KeyCode::End,
            Ct::PageUp => KeyCode::PageUp,
            Ct::PageDown => KeyCode::PageDown,
            _ => return None,
        };

        let mut modifiers = KeyModifiers::NONE;
        if event.modifiers.contains(CtMods::CONTROL) {
            modifiers |= KeyModifiers::CONTROL;
        }
        if event.modifiers.contains(CtMods::ALT) {
            modifiers |= KeyModifiers::ALT;
        }
        if event.modifiers.contains(CtMods::SHIFT) {
            modifiers |= KeyModifiers::SHIFT;
        }

        Some(Self::new(code, modifiers).normalized())
    }
}
