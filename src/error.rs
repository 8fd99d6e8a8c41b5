use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

/// Error severity for notification display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable
    Error,    // operation failed
    Critical, // requires user action
}

/// Domain-specific errors for Key Promoter
#[derive(Error, Debug)]
pub enum KeyPromoterError {
    #[error("Export target already exists: {}", path.display())]
    ExportTargetExists { path: PathBuf },

    #[error("I/O failed for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist data: {0}")]
    Persistence(String),

    #[error("Invalid value '{value}' for setting '{name}'")]
    InvalidSetting { name: String, value: String },

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl KeyPromoterError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ExportTargetExists { .. } => ErrorSeverity::Warning,
            Self::Io { .. } => ErrorSeverity::Error,
            Self::Persistence(_) => ErrorSeverity::Critical,
            Self::InvalidSetting { .. } => ErrorSeverity::Warning,
            Self::UnknownSetting(_) => ErrorSeverity::Warning,
            Self::UnknownAction(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::ExportTargetExists { path } => format!(
                "There is already an exported file, delete {} first",
                path.display()
            ),
            Self::Io { path, .. } => format!("Could not access {}", path.display()),
            Self::Persistence(msg) => format!("Failed to save key promoter data: {}", msg),
            Self::InvalidSetting { .. } => "please specify a valid number".to_string(),
            Self::UnknownSetting(name) => format!("There is no setting named '{}'", name),
            Self::UnknownAction(id) => format!("There is no action named '{}'", id),
        }
    }
}

pub type Result<T> = std::result::Result<T, KeyPromoterError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the host must not see the failure.
///
/// ```ignore
/// use key_promoter::error::ResultExt;
///
/// // Instrumentation failure is logged, dispatch carries on
/// observer.observe(command_id).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None.
    fn log_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }
}
