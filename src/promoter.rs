//! The attribution engine as the host sees it
//!
//! [`KeyPromoter`] wires the catalog, matcher, statistics, interceptor,
//! reporting and export together:
//!
//! - UI event -> label match -> pointer statistics + hotkey notices
//! - programmatic dispatch -> interceptor -> keyboard statistics (+ optional description notice)
//! - user actions -> statistics report / templated export
//!
//! State is persisted through the [`DataStore`] after every mutation. A
//! failed write is reported through the [`Notifier`] and the in-memory
//! state stays authoritative for the rest of the session.
//!
//! Locks are never held while calling the notifier or the host's dispatch.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::CommandCatalog;
use crate::config::{Settings, EXPORT_FILE_NAME};
use crate::error::{ErrorSeverity, KeyPromoterError, Result};
use crate::export::{render_export, ExportTarget};
use crate::interceptor::{self, DispatchObserver, DispatchSlot, InterceptionHandle};
use crate::matcher::{match_label, LabelMatch};
use crate::notifications::{Notice, Notifier};
use crate::reporting::StatisticsReport;
use crate::shortcuts::{format_shortcuts, join_hotkeys, Platform};
use crate::statistics::{Channel, StatisticsStore};
use crate::storage::{DataStore, PersistedState};

/// A UI interaction, built per event and discarded after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionEvent {
    pub label: String,
    pub channel: Channel,
    /// The event originated in a region the host excludes from attribution
    pub excluded: bool,
}

impl InteractionEvent {
    pub fn new(label: impl Into<String>, channel: Channel) -> Self {
        Self {
            label: label.into(),
            channel,
            excluded: false,
        }
    }

    /// Pointer event on an element: the accessible label wins, the
    /// visible text is the fallback.
    pub fn from_element(aria_label: Option<&str>, inner_text: Option<&str>, excluded: bool) -> Self {
        let label = aria_label
            .filter(|label| !label.trim().is_empty())
            .or(inner_text)
            .unwrap_or_default();
        Self {
            label: label.to_string(),
            channel: Channel::Pointer,
            excluded,
        }
    }

    pub fn excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }
}

/// Why an event was dropped before matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Excluded,
    EmptyLabel,
}

/// What happened to an interaction event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    Ignored(IgnoreReason),
    /// Too many candidates; nothing was recorded
    Ambiguous { candidates: usize, threshold: usize },
    /// Commands credited with the event, in catalog order (may be empty)
    Attributed { command_ids: Vec<String> },
}

/// A user-invocable action the engine registers with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAction {
    pub id: &'static str,
    pub name: &'static str,
}

pub const ACTION_STATISTICS: UserAction = UserAction {
    id: "statistics",
    name: "Statistics",
};

pub const ACTION_EXPORT_HOTKEYS: UserAction = UserAction {
    id: "export-hotkeys",
    name: "Export hotkeys",
};

/// Result of running a [`UserAction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutput {
    Statistics(StatisticsReport),
    Exported(PathBuf),
}

struct Shared {
    catalog: Arc<dyn CommandCatalog>,
    data_store: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    platform: Platform,
    state: Mutex<PersistedState>,
}

impl Shared {
    /// Write the document; on failure log and build the notice to show.
    fn persist(&self, state: &PersistedState) -> std::result::Result<(), (anyhow::Error, Notice)> {
        match state.persist(&*self.data_store) {
            Ok(()) => Ok(()),
            Err(err) => {
                let detail = format!("{:#}", err);
                error!(event_type = "persistence", error = %detail, "Failed to persist state");
                let user_error = KeyPromoterError::Persistence(detail);
                let notice = Notice::plain(user_error.user_message(), None)
                    .with_severity(user_error.severity());
                Err((err, notice))
            }
        }
    }

    fn notify_all(&self, notices: Vec<Notice>) {
        for notice in notices {
            self.notifier.notify(notice);
        }
    }

    fn hotkeys_for(&self, command_id: &str) -> Vec<String> {
        match self.catalog.lookup(command_id) {
            Some(command) => format_shortcuts(self.catalog.effective_shortcuts(command), self.platform),
            None => Vec::new(),
        }
    }

    fn observe_dispatch(&self, command_id: &str) -> anyhow::Result<()> {
        let Some(command) = self.catalog.lookup(command_id) else {
            debug!(command_id, "Dispatched command not in catalog, skipping");
            return Ok(());
        };

        let mut notices = Vec::new();
        let mut failure = None;
        let settings = {
            let mut state = self.state.lock();
            if state.settings.track_programmatic_invocations {
                let count = state.statistics.record(Channel::Keyboard, &command.id);
                info!(
                    event_type = "attribution",
                    channel = %Channel::Keyboard,
                    command_id = %command.id,
                    count,
                    "Recorded programmatic invocation"
                );
                if let Err((err, notice)) = self.persist(&state) {
                    notices.push(notice);
                    failure = Some(err);
                }
            }
            state.settings.clone()
        };

        if settings.describe_invocations {
            let hotkeys = self.hotkeys_for(&command.id);
            let hotkey_text = if hotkeys.is_empty() {
                settings.unassigned_marker.clone()
            } else {
                join_hotkeys(&hotkeys)
            };
            notices.push(Notice::plain(
                format!("{} via {}", command.name, hotkey_text),
                settings.notification_timeout(),
            ));
        }

        self.notify_all(notices);
        match failure {
            Some(err) => Err(err).context("Keyboard statistics not saved"),
            None => Ok(()),
        }
    }
}

struct PromoterObserver {
    shared: Weak<Shared>,
}

impl DispatchObserver for PromoterObserver {
    fn observe(&self, command_id: &str) -> anyhow::Result<()> {
        match self.shared.upgrade() {
            Some(shared) => shared.observe_dispatch(command_id),
            None => {
                debug!(command_id, "Engine dropped, dispatch not recorded");
                Ok(())
            }
        }
    }
}

/// The interaction-attribution engine.
pub struct KeyPromoter {
    shared: Arc<Shared>,
    interception: Mutex<Option<InterceptionHandle>>,
}

impl KeyPromoter {
    /// Load persisted state for the current platform.
    pub fn load(
        catalog: Arc<dyn CommandCatalog>,
        data_store: Arc<dyn DataStore>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        Self::load_for_platform(catalog, data_store, notifier, Platform::current())
    }

    /// Load persisted state, merge it with defaults and write it back.
    #[instrument(name = "key_promoter_load", skip_all, fields(platform = ?platform))]
    pub fn load_for_platform(
        catalog: Arc<dyn CommandCatalog>,
        data_store: Arc<dyn DataStore>,
        notifier: Arc<dyn Notifier>,
        platform: Platform,
    ) -> anyhow::Result<Self> {
        let state = PersistedState::load(&*data_store).context("Failed to load key promoter data")?;
        let shared = Arc::new(Shared {
            catalog,
            data_store,
            notifier,
            platform,
            state: Mutex::new(state),
        });

        let notice = {
            let state = shared.state.lock();
            shared.persist(&state).err().map(|(_, notice)| notice)
        };
        shared.notify_all(notice.into_iter().collect());

        info!(event_type = "app_lifecycle", action = "loaded", "Key promoter loaded");
        Ok(Self {
            shared,
            interception: Mutex::new(None),
        })
    }

    pub fn platform(&self) -> Platform {
        self.shared.platform
    }

    pub fn settings(&self) -> Settings {
        self.shared.state.lock().settings.clone()
    }

    /// Snapshot of the usage statistics
    pub fn statistics(&self) -> StatisticsStore {
        self.shared.state.lock().statistics.clone()
    }

    /// Attribute a UI interaction to the commands its label evokes.
    pub fn handle_interaction(&self, event: &InteractionEvent) -> InteractionOutcome {
        if event.excluded {
            return InteractionOutcome::Ignored(IgnoreReason::Excluded);
        }

        let shared = &*self.shared;
        let settings = self.settings();
        let candidates = match match_label(&event.label, &*shared.catalog, settings.threshold) {
            LabelMatch::EmptyLabel => return InteractionOutcome::Ignored(IgnoreReason::EmptyLabel),
            LabelMatch::Ambiguous {
                candidates,
                threshold,
            } => {
                if settings.notify_ambiguous {
                    shared.notifier.notify(Notice::plain(
                        format!("Too many matching commands ({}) for '{}'", candidates, event.label.trim()),
                        settings.notification_timeout(),
                    ));
                }
                return InteractionOutcome::Ambiguous {
                    candidates,
                    threshold,
                };
            }
            LabelMatch::Candidates(commands) => commands,
        };

        let timeout = settings.notification_timeout();
        let mut notices = Vec::new();
        let mut command_ids = Vec::with_capacity(candidates.len());
        for command in candidates {
            {
                let mut state = shared.state.lock();
                let count = state.statistics.record(event.channel, &command.id);
                info!(
                    event_type = "attribution",
                    channel = %event.channel,
                    command_id = %command.id,
                    count,
                    "Attributed interaction"
                );
                if let Err((_, notice)) = shared.persist(&state) {
                    notices.push(notice);
                }
            }

            let hotkeys = format_shortcuts(shared.catalog.effective_shortcuts(command), shared.platform);
            if hotkeys.is_empty() {
                if settings.show_unassigned {
                    notices.push(Notice::hotkey_unassigned(&command.id, &command.name, timeout));
                }
            } else if settings.show_assigned {
                for hotkey in &hotkeys {
                    notices.push(Notice::hotkey_assigned(&command.id, &command.name, hotkey, timeout));
                }
            }
            command_ids.push(command.id.clone());
        }

        shared.notify_all(notices);
        InteractionOutcome::Attributed { command_ids }
    }

    /// Observe a programmatic dispatch directly (the interceptor calls this).
    pub fn observe_dispatch(&self, command_id: &str) -> anyhow::Result<()> {
        self.shared.observe_dispatch(command_id)
    }

    /// Wrap the host's dispatch entry point. Idempotent.
    pub fn install_interceptor(&self, slot: &Arc<DispatchSlot>) -> InterceptionHandle {
        let mut current = self.interception.lock();
        if let Some(handle) = current.as_ref().filter(|h| h.is_active()) {
            return handle.clone();
        }
        let observer = Arc::new(PromoterObserver {
            shared: Arc::downgrade(&self.shared),
        });
        let handle = interceptor::install(slot, observer);
        *current = Some(handle.clone());
        handle
    }

    /// Restore the host's dispatch entry point. Safe to call repeatedly.
    pub fn shutdown(&self) {
        if let Some(handle) = self.interception.lock().take() {
            handle.teardown();
        }
        info!(event_type = "app_lifecycle", action = "unloaded", "Key promoter unloaded");
    }

    pub fn actions(&self) -> [UserAction; 2] {
        [ACTION_STATISTICS, ACTION_EXPORT_HOTKEYS]
    }

    pub fn run_action(&self, action_id: &str, target: &dyn ExportTarget) -> Result<ActionOutput> {
        match action_id {
            id if id == ACTION_STATISTICS.id => Ok(ActionOutput::Statistics(self.show_statistics())),
            id if id == ACTION_EXPORT_HOTKEYS.id => self.export_shortcuts(target).map(ActionOutput::Exported),
            other => Err(KeyPromoterError::UnknownAction(other.to_string())),
        }
    }

    /// Ranked usage report for both channels.
    pub fn show_statistics(&self) -> StatisticsReport {
        let state = self.shared.state.lock();
        StatisticsReport::build(&state.statistics, &*self.shared.catalog, self.shared.platform)
    }

    /// Render the templated export without writing it.
    pub fn render_export(&self) -> String {
        let settings = self.settings();
        render_export(
            &*self.shared.catalog,
            &settings.export_template,
            settings.export_filter(),
            self.shared.platform,
            &settings.unassigned_marker,
        )
    }

    /// Write the templated export to `hotkeys-export.md`.
    ///
    /// Aborts before writing when the file already exists.
    #[instrument(name = "export_shortcuts", skip_all)]
    pub fn export_shortcuts(&self, target: &dyn ExportTarget) -> Result<PathBuf> {
        let path = Path::new(EXPORT_FILE_NAME);
        let settings = self.settings();
        let timeout = settings.notification_timeout();
        if settings.export_filter().excludes_everything() {
            warn!(
                event_type = "export",
                "Both assigned and unassigned commands are excluded, export will be empty"
            );
        }

        let result = if target.exists(path) {
            Err(KeyPromoterError::ExportTargetExists {
                path: path.to_path_buf(),
            })
        } else {
            target.create(path, &self.render_export())
        };

        match result {
            Ok(()) => {
                self.shared
                    .notifier
                    .notify(Notice::plain("Exported hotkeys", timeout));
                Ok(path.to_path_buf())
            }
            Err(err) => {
                error!(error = %err, "Export failed");
                self.shared.notifier.notify(
                    Notice::plain(err.user_message(), timeout).with_severity(err.severity()),
                );
                Err(err)
            }
        }
    }

    /// Apply a settings change and persist it.
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let notice = {
            let mut state = self.shared.state.lock();
            update(&mut state.settings);
            self.shared.persist(&state).err().map(|(_, notice)| notice)
        };
        self.shared.notify_all(notice.into_iter().collect());
    }

    /// Set a setting from user-entered text; invalid input is reported and rejected.
    pub fn set_setting(&self, name: &str, value: &str) -> Result<()> {
        let mut settings = self.settings();
        if let Err(err) = settings.set_from_text(name, value) {
            self.shared.notifier.notify(
                Notice::plain(err.user_message(), None).with_severity(ErrorSeverity::Warning),
            );
            return Err(err);
        }
        self.update_settings(|current| *current = settings);
        Ok(())
    }

    /// Reset one setting to its default value.
    pub fn reset_setting(&self, name: &str) -> Result<()> {
        let mut settings = self.settings();
        settings.reset(name)?;
        self.update_settings(|current| *current = settings);
        Ok(())
    }
}

impl Drop for KeyPromoter {
    fn drop(&mut self) {
        if let Some(handle) = self.interception.get_mut().take() {
            handle.teardown();
        }
    }
}

#[cfg(test)]
#[path = "promoter_tests.rs"]
mod tests;
