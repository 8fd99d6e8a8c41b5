//! Configuration module - user settings and their defaults
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - The `Settings` struct, its serde defaults and text updates

mod defaults;
mod types;

pub use defaults::{
    DEFAULT_EXPORT_TEMPLATE, DEFAULT_NOTIFICATION_TIMEOUT_SECONDS, EXPORT_FILE_NAME,
};

pub use types::{Settings, SettingValue, SETTING_NAMES};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
