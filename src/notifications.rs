//! Notices shown to the user through the host's notification surface
//!
//! A [`Notice`] is a list of styled fragments plus an optional auto-dismiss
//! duration and an optional click action. The host renders it; this crate
//! only builds notices and hands them to a [`Notifier`].

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ErrorSeverity;

/// Styled piece of notice text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeFragment {
    Text(String),
    Bold(String),
    Code(String),
}

impl NoticeFragment {
    pub fn text(&self) -> &str {
        match self {
            NoticeFragment::Text(s) | NoticeFragment::Bold(s) | NoticeFragment::Code(s) => s,
        }
    }
}

/// What clicking a notice does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAction {
    /// Open the host's hotkey settings filtered by `query`
    OpenHotkeySettings { query: String },
}

/// A notification for the host to display
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub fragments: Vec<NoticeFragment>,
    pub severity: ErrorSeverity,
    /// `None` keeps the notice until the user dismisses it
    pub timeout: Option<Duration>,
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn new(fragments: Vec<NoticeFragment>, timeout: Option<Duration>) -> Self {
        Self {
            fragments,
            severity: ErrorSeverity::Info,
            timeout,
            action: None,
        }
    }

    /// Plain single-fragment notice
    pub fn plain(message: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self::new(vec![NoticeFragment::Text(message.into())], timeout)
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_action(mut self, action: NoticeAction) -> Self {
        self.action = Some(action);
        self
    }

    /// "Hotkey for **name** is `hotkey`"
    pub fn hotkey_assigned(
        command_id: &str,
        command_name: &str,
        hotkey: &str,
        timeout: Option<Duration>,
    ) -> Self {
        Self::new(
            vec![
                NoticeFragment::Text("Hotkey for ".to_string()),
                NoticeFragment::Bold(command_name.to_string()),
                NoticeFragment::Text(" is ".to_string()),
                NoticeFragment::Code(hotkey.to_string()),
            ],
            timeout,
        )
        .with_action(NoticeAction::OpenHotkeySettings {
            query: command_id.to_string(),
        })
    }

    /// "Hotkey for **name** is not set"
    pub fn hotkey_unassigned(command_id: &str, command_name: &str, timeout: Option<Duration>) -> Self {
        Self::new(
            vec![
                NoticeFragment::Text("Hotkey for ".to_string()),
                NoticeFragment::Bold(command_name.to_string()),
                NoticeFragment::Text(" is not set".to_string()),
            ],
            timeout,
        )
        .with_action(NoticeAction::OpenHotkeySettings {
            query: command_id.to_string(),
        })
    }

    /// Plain text of all fragments
    pub fn message(&self) -> String {
        self.fragments.iter().map(NoticeFragment::text).collect()
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            match fragment {
                NoticeFragment::Text(s) => f.write_str(s)?,
                NoticeFragment::Bold(s) => write!(f, "**{}**", s)?,
                NoticeFragment::Code(s) => write!(f, "`{}`", s)?,
            }
        }
        Ok(())
    }
}

/// The host's notification surface.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            ErrorSeverity::Info => {
                tracing::info!(event_type = "notice", timeout = ?notice.timeout, "{}", notice)
            }
            ErrorSeverity::Warning => {
                tracing::warn!(event_type = "notice", timeout = ?notice.timeout, "{}", notice)
            }
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                tracing::error!(event_type = "notice", timeout = ?notice.timeout, "{}", notice)
            }
        }
    }
}

/// Notifier that keeps every notice, for hosts that render in batches.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the collected notices.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_notice_fragments() {
        let notice = Notice::hotkey_assigned("editor:save", "Save", "Ctrl + s", None);
        assert_eq!(notice.message(), "Hotkey for Save is Ctrl + s");
        assert_eq!(notice.to_string(), "Hotkey for **Save** is `Ctrl + s`");
        assert_eq!(
            notice.action,
            Some(NoticeAction::OpenHotkeySettings {
                query: "editor:save".to_string()
            })
        );
    }

    #[test]
    fn unassigned_notice_fragments() {
        let notice =
            Notice::hotkey_unassigned("app:close", "Close", Some(Duration::from_secs(5)));
        assert_eq!(notice.message(), "Hotkey for Close is not set");
        assert_eq!(notice.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn collecting_notifier_drains() {
        let notifier = CollectingNotifier::new();
        notifier.notify(Notice::plain("one", None));
        notifier.notify(Notice::plain("two", None));
        assert_eq!(notifier.len(), 2);

        let notices = notifier.drain();
        assert_eq!(notices.len(), 2);
        assert!(notifier.is_empty());
    }
}
