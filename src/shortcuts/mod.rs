//! Shortcut model and display formatting.
//!
//! This module provides:
//! - The host's key binding model (`Shortcut`, `ModifierToken`)
//! - Platform-aware display formatting
//! - Parsing of the host's textual `Mod+Shift+k` form
//!
//! # Example
//!
//! ```ignore
//! use key_promoter::shortcuts::{Platform, Shortcut};
//!
//! let shortcut = Shortcut::parse("Mod+s")?;
//! assert_eq!(shortcut.display_for_platform(Platform::MacOS), "Cmd + s");
//! assert_eq!(shortcut.display_for_platform(Platform::Linux), "Ctrl + s");
//! ```

mod types;


pub use types::{
    format_shortcut, format_shortcuts, join_hotkeys, ModifierToken, Platform, Shortcut,
    ShortcutParseError,
};
