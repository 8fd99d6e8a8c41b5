//! Configuration type definitions
//!
//! Every field carries a serde default so a partial or legacy data file
//! merges with the defaults at load time.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use super::defaults::*;
use crate::error::{KeyPromoterError, Result};
use crate::export::ExportFilter;

/// User-facing settings of the attribution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Notify for commands that do have a shortcut (default: true)
    #[serde(default = "default_show_assigned")]
    pub show_assigned: bool,
    /// Notify for commands without a shortcut (default: true)
    #[serde(default = "default_show_unassigned")]
    pub show_unassigned: bool,
    /// Abstain when a label evokes more than this many commands (default: 0 = unbounded)
    #[serde(default = "default_threshold", deserialize_with = "deserialize_threshold")]
    pub threshold: usize,
    /// Auto-dismiss delay for notices in seconds (default: 5; 0 keeps them open)
    #[serde(default = "default_notification_timeout", alias = "notificationTimeout")]
    pub notification_timeout_seconds: f64,
    /// Count programmatic dispatches on the keyboard channel (default: true)
    #[serde(default = "default_track_programmatic_invocations")]
    pub track_programmatic_invocations: bool,
    /// Show the name and shortcuts of every dispatched command (default: false)
    #[serde(default = "default_describe_invocations", alias = "descriptionOfActions")]
    pub describe_invocations: bool,
    /// Show a single notice when a label is ambiguous (default: false)
    #[serde(default = "default_notify_ambiguous")]
    pub notify_ambiguous: bool,
    /// Line template for the shortcut export
    #[serde(default = "default_export_template", alias = "template")]
    pub export_template: String,
    /// Include commands with shortcuts in the export (default: true)
    #[serde(default = "default_export_assigned")]
    pub export_assigned: bool,
    /// Include commands without shortcuts in the export (default: true)
    #[serde(default = "default_export_unassigned")]
    pub export_unassigned: bool,
    /// Text rendered in place of a missing shortcut (default: empty)
    #[serde(default = "default_unassigned_marker")]
    pub unassigned_marker: String,
}

fn default_show_assigned() -> bool {
    DEFAULT_SHOW_ASSIGNED
}
fn default_show_unassigned() -> bool {
    DEFAULT_SHOW_UNASSIGNED
}
fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}
/// Older data files store the threshold as any JSON number.
/// Fractions are floored; negative, non-finite or non-numeric values mean unbounded.
fn deserialize_threshold<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let threshold = match value.as_u64() {
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        None => match value.as_f64() {
            Some(n) if n.is_finite() && n >= 1.0 => {
                if n >= usize::MAX as f64 {
                    usize::MAX
                } else {
                    n.floor() as usize
                }
            }
            _ => DEFAULT_THRESHOLD,
        },
    };
    Ok(threshold)
}
fn default_notification_timeout() -> f64 {
    DEFAULT_NOTIFICATION_TIMEOUT_SECONDS
}
fn default_track_programmatic_invocations() -> bool {
    DEFAULT_TRACK_PROGRAMMATIC_INVOCATIONS
}
fn default_describe_invocations() -> bool {
    DEFAULT_DESCRIBE_INVOCATIONS
}
fn default_notify_ambiguous() -> bool {
    DEFAULT_NOTIFY_AMBIGUOUS
}
fn default_export_template() -> String {
    DEFAULT_EXPORT_TEMPLATE.to_string()
}
fn default_export_assigned() -> bool {
    DEFAULT_EXPORT_ASSIGNED
}
fn default_export_unassigned() -> bool {
    DEFAULT_EXPORT_UNASSIGNED
}
fn default_unassigned_marker() -> String {
    DEFAULT_UNASSIGNED_MARKER.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            show_assigned: DEFAULT_SHOW_ASSIGNED,
            show_unassigned: DEFAULT_SHOW_UNASSIGNED,
            threshold: DEFAULT_THRESHOLD,
            notification_timeout_seconds: DEFAULT_NOTIFICATION_TIMEOUT_SECONDS,
            track_programmatic_invocations: DEFAULT_TRACK_PROGRAMMATIC_INVOCATIONS,
            describe_invocations: DEFAULT_DESCRIBE_INVOCATIONS,
            notify_ambiguous: DEFAULT_NOTIFY_AMBIGUOUS,
            export_template: default_export_template(),
            export_assigned: DEFAULT_EXPORT_ASSIGNED,
            export_unassigned: DEFAULT_EXPORT_UNASSIGNED,
            unassigned_marker: default_unassigned_marker(),
        }
    }
}

/// Names accepted by [`Settings::get`], [`Settings::set_from_text`] and [`Settings::reset`].
pub const SETTING_NAMES: &[&str] = &[
    "showAssigned",
    "showUnassigned",
    "threshold",
    "notificationTimeoutSeconds",
    "trackProgrammaticInvocations",
    "describeInvocations",
    "notifyAmbiguous",
    "exportTemplate",
    "exportAssigned",
    "exportUnassigned",
    "unassignedMarker",
];

/// A single setting value, as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &str) -> KeyPromoterError {
    KeyPromoterError::InvalidSetting {
        name: name.to_string(),
        value: value.to_string(),
    }
}

impl Settings {
    /// Notice auto-dismiss delay; `None` keeps the notice until dismissed.
    pub fn notification_timeout(&self) -> Option<Duration> {
        let seconds = self.notification_timeout_seconds;
        if seconds > 0.0 {
            // out-of-range values behave like "until dismissed"
            Duration::try_from_secs_f64(seconds).ok()
        } else {
            None
        }
    }

    /// Which commands the export includes.
    pub fn export_filter(&self) -> ExportFilter {
        ExportFilter {
            include_assigned: self.export_assigned,
            include_unassigned: self.export_unassigned,
        }
    }

    /// Read a setting by its camelCase name.
    pub fn get(&self, name: &str) -> Result<SettingValue> {
        let value = match name {
            "showAssigned" => SettingValue::Bool(self.show_assigned),
            "showUnassigned" => SettingValue::Bool(self.show_unassigned),
            "threshold" => SettingValue::Number(self.threshold as f64),
            "notificationTimeoutSeconds" => {
                SettingValue::Number(self.notification_timeout_seconds)
            }
            "trackProgrammaticInvocations" => {
                SettingValue::Bool(self.track_programmatic_invocations)
            }
            "describeInvocations" => SettingValue::Bool(self.describe_invocations),
            "notifyAmbiguous" => SettingValue::Bool(self.notify_ambiguous),
            "exportTemplate" => SettingValue::Text(self.export_template.clone()),
            "exportAssigned" => SettingValue::Bool(self.export_assigned),
            "exportUnassigned" => SettingValue::Bool(self.export_unassigned),
            "unassignedMarker" => SettingValue::Text(self.unassigned_marker.clone()),
            _ => return Err(KeyPromoterError::UnknownSetting(name.to_string())),
        };
        Ok(value)
    }

    /// Update a setting from user-entered text.
    ///
    /// Numbers are validated; on error the setting keeps its old value.
    pub fn set_from_text(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "showAssigned" => self.show_assigned = parse_bool(name, value)?,
            "showUnassigned" => self.show_unassigned = parse_bool(name, value)?,
            "threshold" => {
                self.threshold = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid(name, value))?
            }
            "notificationTimeoutSeconds" => {
                let seconds = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid(name, value))?;
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(invalid(name, value));
                }
                self.notification_timeout_seconds = seconds;
            }
            "trackProgrammaticInvocations" => {
                self.track_programmatic_invocations = parse_bool(name, value)?
            }
            "describeInvocations" => self.describe_invocations = parse_bool(name, value)?,
            "notifyAmbiguous" => self.notify_ambiguous = parse_bool(name, value)?,
            "exportTemplate" => self.export_template = value.to_string(),
            "exportAssigned" => self.export_assigned = parse_bool(name, value)?,
            "exportUnassigned" => self.export_unassigned = parse_bool(name, value)?,
            "unassignedMarker" => self.unassigned_marker = value.to_string(),
            _ => return Err(KeyPromoterError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    /// Reset a single setting to its default value.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let defaults = Settings::default();
        let value = defaults.get(name)?;
        match value {
            SettingValue::Bool(b) => self.set_from_text(name, &b.to_string()),
            SettingValue::Number(n) => self.set_from_text(name, &n.to_string()),
            SettingValue::Text(s) => self.set_from_text(name, &s),
        }
    }
}
