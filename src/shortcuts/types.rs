//! Core shortcut types with proper error handling and platform-aware display.
//!
//! This module provides:
//! - `Shortcut` - A host key binding (modifier set + key)
//! - `ModifierToken` - The closed set of modifier tokens a host records
//! - `ShortcutParseError` - Detailed parse errors for user feedback
//! - Platform-aware display (`Cmd + k` on macOS, `Ctrl + k` on Windows/Linux)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("unknown token '{0}' in shortcut")]
    UnknownToken(String),
}

/// Modifier tokens as the host records them.
///
/// `Mod` is the platform accelerator and `Meta` the platform meta key;
/// both render differently depending on the [`Platform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierToken {
    Mod,
    Ctrl,
    Meta,
    Shift,
    Alt,
}

impl ModifierToken {
    /// Display label for this modifier on the given platform.
    pub fn label(self, platform: Platform) -> &'static str {
        match self {
            Self::Mod if platform.uses_command_key() => "Cmd",
            Self::Mod => "Ctrl",
            Self::Meta if platform.uses_command_key() => "Cmd",
            Self::Meta => "Win",
            Self::Ctrl => "Ctrl",
            Self::Shift => "Shift",
            Self::Alt => "Alt",
        }
    }
}

impl FromStr for ModifierToken {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mod" => Ok(Self::Mod),
            "ctrl" | "control" | "ctl" => Ok(Self::Ctrl),
            "meta" | "cmd" | "command" | "win" | "super" => Ok(Self::Meta),
            "shift" | "shft" => Ok(Self::Shift),
            "alt" | "opt" | "option" => Ok(Self::Alt),
            _ => Err(ShortcutParseError::UnknownToken(s.to_string())),
        }
    }
}

/// Platform enum for display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Platform::Linux
        }
    }

    /// Whether this platform's convention uses a command key as the accelerator.
    pub fn uses_command_key(self) -> bool {
        matches!(self, Platform::MacOS)
    }
}

/// A key binding consisting of modifier tokens and a main key.
///
/// Modifiers keep the host's order and never repeat. Deserializes from
/// either `{"modifiers": ["Mod"], "key": "k"}` or `"Mod+k"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ShortcutRepr")]
pub struct Shortcut {
    pub modifiers: Vec<ModifierToken>,
    pub key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ShortcutRepr {
    Text(String),
    Structured {
        #[serde(default)]
        modifiers: Vec<ModifierToken>,
        key: String,
    },
}

impl TryFrom<ShortcutRepr> for Shortcut {
    type Error = ShortcutParseError;

    fn try_from(repr: ShortcutRepr) -> Result<Self, Self::Error> {
        match repr {
            ShortcutRepr::Text(text) => Shortcut::parse(&text),
            ShortcutRepr::Structured { modifiers, key } => {
                if key.is_empty() {
                    return Err(ShortcutParseError::MissingKey);
                }
                Ok(Shortcut::new(modifiers, key))
            }
        }
    }
}

impl Shortcut {
    pub fn new(modifiers: impl IntoIterator<Item = ModifierToken>, key: impl Into<String>) -> Self {
        let mut unique = Vec::new();
        for modifier in modifiers {
            if !unique.contains(&modifier) {
                unique.push(modifier);
            }
        }
        Self {
            modifiers: unique,
            key: key.into(),
        }
    }

    /// A shortcut without modifiers.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new([], key)
    }

    /// Parse the host's textual form, e.g. `Mod+Shift+k`.
    ///
    /// The last `+`-separated token is the key; everything before it must
    /// be a modifier. The key keeps its case.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        // "+" alone or a trailing "++" binds the plus key itself
        let (key, modifier_text) = if s == "+" {
            ("+", "")
        } else if let Some(prefix) = s.strip_suffix("++") {
            ("+", prefix)
        } else {
            match s.rsplit_once('+') {
                Some((prefix, key)) => (key.trim(), prefix),
                None => (s, ""),
            }
        };
        if key.is_empty() || key.parse::<ModifierToken>().is_ok() {
            return Err(ShortcutParseError::MissingKey);
        }
        let modifier_parts: Vec<&str> = if modifier_text.trim().is_empty() {
            Vec::new()
        } else {
            modifier_text.split('+').map(str::trim).collect()
        };

        let modifiers = modifier_parts
            .iter()
            .map(|part| part.parse::<ModifierToken>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(modifiers, key))
    }

    /// Canonical display string for the current platform.
    pub fn display(&self) -> String {
        self.display_for_platform(Platform::current())
    }

    /// `"<modifiers joined by '+'> + <key>"`, or just `<key>` without modifiers.
    pub fn display_for_platform(&self, platform: Platform) -> String {
        if self.modifiers.is_empty() {
            return self.key.clone();
        }
        let modifiers: Vec<&str> = self.modifiers.iter().map(|m| m.label(platform)).collect();
        format!("{} + {}", modifiers.join("+"), self.key)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shortcut::parse(s)
    }
}

/// Render one shortcut for display.
pub fn format_shortcut(shortcut: &Shortcut, platform: Platform) -> String {
    shortcut.display_for_platform(platform)
}

/// Render every shortcut of a binding set, preserving order.
pub fn format_shortcuts(shortcuts: &[Shortcut], platform: Platform) -> Vec<String> {
    shortcuts
        .iter()
        .map(|s| format_shortcut(s, platform))
        .collect()
}

/// Join rendered hotkeys into the single-cell form used in notices and exports.
pub fn join_hotkeys(hotkeys: &[String]) -> String {
    hotkeys.join(",")
}
