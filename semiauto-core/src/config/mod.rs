pub mod keys;

use crate::transport::ReplyPath;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub use keys::{Command, KeysConfig};

pub const APP_NAME: &str = "semiauto";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6666;
pub const DEFAULT_PATH: &str = "/tests";

fn config_dir() -> Option<PathBuf> {
    // Use ~/.config on both Linux and macOS (not ~/Library/Application Support)
    #[cfg(unix)]
    {
        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config_home.is_empty()
        {
            return Some(PathBuf::from(xdg_config_home).join(APP_NAME));
        }
        dirs::home_dir().map(|home| home.join(".config").join(APP_NAME))
    }
    #[cfg(windows)]
    {
        dirs::config_dir().map(|dir| dir.join(APP_NAME))
    }
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the test runner listens.
    #[serde(default)]
    pub server: ServerConfig,

    /// Wire protocol options.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Color theme configuration.
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Key binding configuration.
    /// To unbind an inherited key mapping, assign it to `noop`.
    #[serde(default)]
    pub keys: KeysConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Host name or address of the runner (default: "127.0.0.1").
    pub host: String,
    /// Port of the runner (default: 6666).
    pub port: u16,
    /// Path of the test stream (default: "/tests").
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl ServerConfig {
    /// Websocket URL of the test stream, e.g. `ws://127.0.0.1:6666/tests`.
    pub fn endpoint(&self) -> String {
        let path = self.path.trim();
        if path.starts_with('/') {
            format!("ws://{}:{}{path}", self.host, self.port)
        } else {
            format!("ws://{}:{}/{path}", self.host, self.port)
        }
    }
}

/// Which reply vocabulary to speak.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialectSetting {
    /// Follow the framing of the first message from the runner.
    #[default]
    Auto,
    /// Always reply with camelCase names.
    Keyed,
    /// Always reply with snake_case names.
    Legacy,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ProtocolConfig {
    pub dialect: DialectSetting,
    pub reply_path: ReplyPath,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    /// Title and focused control color (default: "magenta").
    #[serde(
        default = "ThemeConfig::default_accent",
        deserialize_with = "deserialize_color"
    )]
    pub accent: ThemeColor,
    /// Running test color (default: "yellow").
    #[serde(
        default = "ThemeConfig::default_running",
        deserialize_with = "deserialize_color"
    )]
    pub running: ThemeColor,
    /// Passed test color (default: "green").
    #[serde(
        default = "ThemeConfig::default_pass",
        deserialize_with = "deserialize_color"
    )]
    pub pass: ThemeColor,
    /// Failed test color (default: "red").
    #[serde(
        default = "ThemeConfig::default_fail",
        deserialize_with = "deserialize_color"
    )]
    pub fail: ThemeColor,
    /// Color for expected failures, skips and unexpected successes (default: "cyan").
    #[serde(
        default = "ThemeConfig::default_expected",
        deserialize_with = "deserialize_color"
    )]
    pub expected: ThemeColor,
    /// Muted/dim text color (default: "gray").
    #[serde(
        default = "ThemeConfig::default_muted",
        deserialize_with = "deserialize_color"
    )]
    pub muted: ThemeColor,
    /// Border color (default: "gray").
    #[serde(
        default = "ThemeConfig::default_border",
        deserialize_with = "deserialize_color"
    )]
    pub border: ThemeColor,
    /// Hint/key binding color (default: "blue").
    #[serde(
        default = "ThemeConfig::default_hint",
        deserialize_with = "deserialize_color"
    )]
    pub hint: ThemeColor,
    /// Error notification color (default: "red").
    #[serde(
        default = "ThemeConfig::default_error",
        deserialize_with = "deserialize_color"
    )]
    pub error: ThemeColor,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: Self::default_accent(),
            running: Self::default_running(),
            pass: Self::default_pass(),
            fail: Self::default_fail(),
            expected: Self::default_expected(),
            muted: Self::default_muted(),
            border: Self::default_border(),
            hint: Self::default_hint(),
            error: Self::default_error(),
        }
    }
}

impl ThemeConfig {
    fn default_accent() -> ThemeColor {
        ThemeColor::Named(NamedColor::Magenta)
    }
    fn default_running() -> ThemeColor {
        ThemeColor::Named(NamedColor::Yellow)
    }
    fn default_pass() -> ThemeColor {
        ThemeColor::Named(NamedColor::Green)
    }
    fn default_fail() -> ThemeColor {
        ThemeColor::Named(NamedColor::Red)
    }
    fn default_expected() -> ThemeColor {
        ThemeColor::Named(NamedColor::Cyan)
    }
    fn default_muted() -> ThemeColor {
        ThemeColor::Named(NamedColor::Gray)
    }
    fn default_border() -> ThemeColor {
        ThemeColor::Named(NamedColor::Gray)
    }
    fn default_hint() -> ThemeColor {
        ThemeColor::Named(NamedColor::Blue)
    }
    fn default_error() -> ThemeColor {
        ThemeColor::Named(NamedColor::Red)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeColor {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    DarkGray,
}

impl NamedColor {
    /// All named colours in alphabetical order, as accepted by the config parser.
    pub const fn all() -> &'static [(&'static str, NamedColor)] {
        &[
            ("black", NamedColor::Black),
            ("blue", NamedColor::Blue),
            ("cyan", NamedColor::Cyan),
            ("dark_gray", NamedColor::DarkGray),
            ("gray", NamedColor::Gray),
            ("green", NamedColor::Green),
            ("magenta", NamedColor::Magenta),
            ("red", NamedColor::Red),
            ("white", NamedColor::White),
            ("yellow", NamedColor::Yellow),
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
            Self::Gray => "gray",
            Self::DarkGray => "dark_gray",
        }
    }
}

impl std::fmt::Display for ThemeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(n) => f.write_str(n.as_str()),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl Serialize for ThemeColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl ThemeColor {
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(hex) = s.strip_prefix('#')
            && hex.len() == 6
        {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Self::Rgb(r, g, b));
        }
        let lower = s.to_lowercase();
        // Handle aliases not in the canonical list
        let lookup = match lower.as_str() {
            "grey" => "gray",
            "dark_grey" | "darkgray" | "darkgrey" => "dark_gray",
            other => other,
        };
        NamedColor::all()
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, color)| Self::Named(*color))
    }
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<ThemeColor, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ThemeColor::parse(&s).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid color '{s}': expected a named color (black, red, green, yellow, blue, magenta, cyan, white, gray/grey, dark_gray) or hex (#rrggbb)"
        ))
    })
}

pub fn load_config_from_str(s: &str) -> Result<Config> {
    let config: Config = toml::from_str(s)?;
    Ok(config)
}

/// Load the config file. An explicit override must exist; the default
/// location is optional and falls back to built-in defaults.
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    let config_file = match config_override {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => match config_file() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    let contents = fs::read_to_string(&config_file)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("{}: {e}", config_file.display()))?;
    log::debug!("loaded config from {}", config_file.display());
    Ok(config)
}
