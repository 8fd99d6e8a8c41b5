//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default notification filters
pub const DEFAULT_SHOW_ASSIGNED: bool = true;
pub const DEFAULT_SHOW_UNASSIGNED: bool = true;
pub const DEFAULT_NOTIFY_AMBIGUOUS: bool = false;

/// Default candidate threshold (0 = unbounded)
pub const DEFAULT_THRESHOLD: usize = 0;

/// Default notification timeout in seconds
pub const DEFAULT_NOTIFICATION_TIMEOUT_SECONDS: f64 = 5.0;

/// Default programmatic invocation handling
pub const DEFAULT_TRACK_PROGRAMMATIC_INVOCATIONS: bool = true;
pub const DEFAULT_DESCRIBE_INVOCATIONS: bool = false;

/// Default export settings
pub const DEFAULT_EXPORT_TEMPLATE: &str = "`{{commandId}}` - {{commandName}} - `{{hotkey}}`\n";
pub const DEFAULT_EXPORT_ASSIGNED: bool = true;
pub const DEFAULT_EXPORT_UNASSIGNED: bool = true;
pub const DEFAULT_UNASSIGNED_MARKER: &str = "";

/// File name of the shortcut export
pub const EXPORT_FILE_NAME: &str = "hotkeys-export.md";
