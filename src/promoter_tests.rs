use super::*;
use crate::catalog::{Command, InMemoryCatalog};
use crate::export::FsExportTarget;
use crate::notifications::{CollectingNotifier, NoticeAction};
use crate::shortcuts::{ModifierToken, Shortcut};
use crate::storage::MemoryStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::tempdir;

/// Store that can be switched to fail every write.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl DataStore for FlakyStore {
    fn load_data(&self) -> anyhow::Result<Option<Value>> {
        self.inner.load_data()
    }

    fn save_data(&self, data: &Value) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.save_data(data)
    }
}

struct Fixture {
    promoter: KeyPromoter,
    store: Arc<MemoryStore>,
    notifier: Arc<CollectingNotifier>,
}

fn close_catalog() -> InMemoryCatalog {
    [
        Command::new("a", "Close pane").with_shortcut(Shortcut::new([ModifierToken::Mod], "w")),
        Command::new("b", "Close all panes"),
        Command::new("x", "Save").with_shortcut(Shortcut::new([ModifierToken::Mod], "s")),
    ]
    .into_iter()
    .collect()
}

fn fixture_with(catalog: InMemoryCatalog, data: Option<Value>) -> Fixture {
    let store = Arc::new(match data {
        Some(data) => MemoryStore::with_data(data),
        None => MemoryStore::new(),
    });
    let notifier = Arc::new(CollectingNotifier::new());
    let promoter = KeyPromoter::load_for_platform(
        Arc::new(catalog),
        store.clone(),
        notifier.clone(),
        Platform::MacOS,
    )
    .unwrap();
    Fixture {
        promoter,
        store,
        notifier,
    }
}

fn fixture() -> Fixture {
    fixture_with(close_catalog(), None)
}

fn click(label: &str) -> InteractionEvent {
    InteractionEvent::new(label, Channel::Pointer)
}

#[test]
fn load_writes_merged_defaults_back() {
    let f = fixture_with(
        close_catalog(),
        Some(json!({ "threshold": 3, "mouseStatistics": { "a": 2 } })),
    );

    let saved = f.store.snapshot().unwrap();
    assert_eq!(saved["threshold"], json!(3));
    assert_eq!(saved["showAssigned"], json!(true));
    assert_eq!(saved["pointerStatistics"]["a"], json!(2));
    assert_eq!(f.promoter.statistics().count(Channel::Pointer, "a"), 2);
    assert!(f.notifier.is_empty());
}

#[test]
fn unbounded_threshold_records_every_candidate() {
    let f = fixture();

    let outcome = f.promoter.handle_interaction(&click("close"));

    assert_eq!(
        outcome,
        InteractionOutcome::Attributed {
            command_ids: vec!["a".to_string(), "b".to_string()]
        }
    );
    let stats = f.promoter.statistics();
    assert_eq!(stats.count(Channel::Pointer, "a"), 1);
    assert_eq!(stats.count(Channel::Pointer, "b"), 1);
    assert_eq!(stats.count(Channel::Keyboard, "a"), 0);

    let saved = f.store.snapshot().unwrap();
    assert_eq!(saved["pointerStatistics"], json!({ "a": 1, "b": 1 }));
}

#[test]
fn ambiguous_match_changes_nothing() {
    let f = fixture();
    f.promoter.update_settings(|s| s.threshold = 1);
    f.promoter.handle_interaction(&click("save"));
    f.notifier.drain();

    let stats_before = f.promoter.statistics();
    let report_before = f.promoter.show_statistics();
    let export_before = f.promoter.render_export();
    let saved_before = f.store.snapshot();

    let outcome = f.promoter.handle_interaction(&click("close"));

    assert_eq!(
        outcome,
        InteractionOutcome::Ambiguous {
            candidates: 2,
            threshold: 1
        }
    );
    assert_eq!(f.promoter.statistics(), stats_before);
    assert_eq!(f.promoter.show_statistics(), report_before);
    assert_eq!(f.promoter.render_export(), export_before);
    assert_eq!(f.store.snapshot(), saved_before);
    assert!(f.notifier.is_empty());
}

#[test]
fn ambiguous_notice_is_opt_in() {
    let f = fixture();
    f.promoter.update_settings(|s| {
        s.threshold = 1;
        s.notify_ambiguous = true;
    });

    f.promoter.handle_interaction(&click("close"));

    let notices = f.notifier.drain();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message().contains("(2)"));
}

#[test]
fn notices_per_shortcut_and_for_unassigned() {
    let mut catalog = close_catalog();
    catalog.set_override(
        "a",
        vec![
            Shortcut::new([ModifierToken::Mod], "w"),
            Shortcut::new([ModifierToken::Ctrl, ModifierToken::Shift], "w"),
        ],
    );
    let f = fixture_with(catalog, None);

    f.promoter.handle_interaction(&click("close"));

    let messages: Vec<String> = f.notifier.drain().iter().map(|n| n.message()).collect();
    assert_eq!(
        messages,
        vec![
            "Hotkey for Close pane is Cmd + w",
            "Hotkey for Close pane is Ctrl+Shift + w",
            "Hotkey for Close all panes is not set",
        ]
    );
}

#[test]
fn notices_respect_show_settings() {
    let f = fixture();
    f.promoter.update_settings(|s| s.show_unassigned = false);
    f.promoter.handle_interaction(&click("close"));
    let notices = f.notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices[0].action,
        Some(NoticeAction::OpenHotkeySettings {
            query: "a".to_string()
        })
    );
    assert_eq!(notices[0].timeout, Some(std::time::Duration::from_secs(5)));

    f.promoter.update_settings(|s| s.show_assigned = false);
    f.promoter.handle_interaction(&click("close"));
    assert!(f.notifier.is_empty());
    // counting is independent of notices
    assert_eq!(f.promoter.statistics().count(Channel::Pointer, "a"), 2);
}

#[test]
fn excluded_and_empty_events_are_ignored() {
    let f = fixture();

    assert_eq!(
        f.promoter.handle_interaction(&click("close").excluded(true)),
        InteractionOutcome::Ignored(IgnoreReason::Excluded)
    );
    assert_eq!(
        f.promoter.handle_interaction(&click("   ")),
        InteractionOutcome::Ignored(IgnoreReason::EmptyLabel)
    );
    assert!(f.promoter.statistics().is_empty());
}

#[test]
fn unmatched_label_attributes_nothing() {
    let f = fixture();
    assert_eq!(
        f.promoter.handle_interaction(&click("rename")),
        InteractionOutcome::Attributed {
            command_ids: Vec::new()
        }
    );
    assert!(f.notifier.is_empty());
}

#[test]
fn element_label_prefers_accessible_label() {
    let event = InteractionEvent::from_element(Some("Close"), Some("X"), false);
    assert_eq!(event.label, "Close");
    assert_eq!(event.channel, Channel::Pointer);

    let event = InteractionEvent::from_element(Some(" "), Some("Save"), true);
    assert_eq!(event.label, "Save");
    assert!(event.excluded);

    assert_eq!(InteractionEvent::from_element(None, None, false).label, "");
}

#[test]
fn intercepted_dispatch_records_keyboard_usage() {
    let f = fixture();
    let slot = DispatchSlot::new(|id, _ctx| id != "b");
    f.promoter.install_interceptor(&slot);

    assert!(slot.dispatch("a", None));
    assert!(!slot.dispatch("b", None));
    assert!(slot.dispatch("not-in-catalog", None));

    let stats = f.promoter.statistics();
    assert_eq!(stats.count(Channel::Keyboard, "a"), 1);
    assert_eq!(stats.count(Channel::Keyboard, "b"), 1);
    assert_eq!(stats.len(Channel::Keyboard), 2);
    assert_eq!(stats.count(Channel::Pointer, "a"), 0);
    assert!(f.notifier.is_empty());
}

#[test]
fn tracking_can_be_disabled_independently_of_descriptions() {
    let f = fixture();
    f.promoter.update_settings(|s| {
        s.track_programmatic_invocations = false;
        s.describe_invocations = true;
        s.unassigned_marker = "-".to_string();
    });
    let slot = DispatchSlot::new(|_, _| true);
    f.promoter.install_interceptor(&slot);

    slot.dispatch("a", None);
    slot.dispatch("b", None);

    assert_eq!(f.promoter.statistics().len(Channel::Keyboard), 0);
    let messages: Vec<String> = f.notifier.drain().iter().map(|n| n.message()).collect();
    assert_eq!(messages, vec!["Close pane via Cmd + w", "Close all panes via -"]);
}

#[test]
fn install_is_idempotent_and_shutdown_restores() {
    let f = fixture();
    let slot = DispatchSlot::new(|_, _| true);

    let first = f.promoter.install_interceptor(&slot);
    let second = f.promoter.install_interceptor(&slot);
    slot.dispatch("a", None);
    assert_eq!(f.promoter.statistics().count(Channel::Keyboard, "a"), 1);
    assert!(first.is_active() && second.is_active());

    f.promoter.shutdown();
    assert!(!slot.is_intercepted());
    slot.dispatch("a", None);
    assert_eq!(f.promoter.statistics().count(Channel::Keyboard, "a"), 1);

    // second shutdown is a no-op
    f.promoter.shutdown();
}

#[test]
fn dropping_the_engine_restores_dispatch() {
    let f = fixture();
    let slot = DispatchSlot::new(|_, _| true);
    f.promoter.install_interceptor(&slot);
    drop(f);

    assert!(!slot.is_intercepted());
    assert!(slot.dispatch("a", None));
}

#[test]
fn huge_notification_timeout_keeps_notices_open() {
    let f = fixture();
    f.promoter
        .set_setting("notificationTimeoutSeconds", "1e300")
        .unwrap();

    f.promoter.handle_interaction(&click("save"));
    assert_eq!(f.promoter.statistics().count(Channel::Pointer, "x"), 1);
    let notices = f.notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].timeout, None);

    let dir = tempdir().unwrap();
    f.promoter
        .export_shortcuts(&FsExportTarget::new(dir.path()))
        .unwrap();
    assert_eq!(f.notifier.drain()[0].timeout, None);
}

#[test]
fn persistence_failure_keeps_counts_and_notifies() {
    let store = Arc::new(FlakyStore::default());
    let notifier = Arc::new(CollectingNotifier::new());
    let promoter = KeyPromoter::load_for_platform(
        Arc::new(close_catalog()),
        store.clone(),
        notifier.clone(),
        Platform::Linux,
    )
    .unwrap();
    promoter.update_settings(|s| {
        s.show_assigned = false;
        s.show_unassigned = false;
    });
    store.failing.store(true, Ordering::SeqCst);

    promoter.handle_interaction(&click("save"));
    promoter.handle_interaction(&click("save"));

    assert_eq!(promoter.statistics().count(Channel::Pointer, "x"), 2);
    let notices = notifier.drain();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].severity, ErrorSeverity::Critical);
    assert!(notices[0].message().contains("disk full"));

    let slot = DispatchSlot::new(|_, _| true);
    promoter.install_interceptor(&slot);
    assert!(promoter.observe_dispatch("x").is_err());
    // the interceptor swallows the same failure
    assert!(slot.dispatch("x", None));
    assert_eq!(promoter.statistics().count(Channel::Keyboard, "x"), 2);
}

#[test]
fn statistics_action_ranks_by_count() {
    let f = fixture();
    f.promoter.handle_interaction(&click("close"));
    f.promoter.handle_interaction(&click("close all"));
    let dir = tempdir().unwrap();

    let output = f
        .promoter
        .run_action("statistics", &FsExportTarget::new(dir.path()))
        .unwrap();
    let ActionOutput::Statistics(report) = output else {
        panic!("expected statistics report");
    };
    let ids: Vec<&str> = report
        .pointer
        .rows
        .iter()
        .map(|r| r.command_id.as_str())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(report.pointer.rows[1].hotkeys, vec!["Cmd + w"]);
}

#[test]
fn export_writes_once_then_refuses() {
    let f = fixture();
    f.promoter.update_settings(|s| {
        s.export_template = "{{commandId}} - {{commandName}} - {{hotkey}}\n".to_string();
        s.export_unassigned = false;
    });
    let dir = tempdir().unwrap();
    let target = FsExportTarget::new(dir.path());

    let path = f.promoter.export_shortcuts(&target).unwrap();
    assert_eq!(path, Path::new(EXPORT_FILE_NAME));
    let written = std::fs::read_to_string(dir.path().join(EXPORT_FILE_NAME)).unwrap();
    assert_eq!(written, "a - Close pane - Cmd + w\nx - Save - Cmd + s\n");
    assert_eq!(f.notifier.drain()[0].message(), "Exported hotkeys");

    let err = f
        .promoter
        .run_action("export-hotkeys", &target)
        .unwrap_err();
    assert!(matches!(err, KeyPromoterError::ExportTargetExists { .. }));
    assert_eq!(
        f.notifier.drain()[0].message(),
        "There is already an exported file, delete hotkeys-export.md first"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join(EXPORT_FILE_NAME)).unwrap(),
        written
    );
}

#[test]
fn export_with_everything_excluded_writes_empty_file() {
    let f = fixture();
    f.promoter.update_settings(|s| {
        s.export_assigned = false;
        s.export_unassigned = false;
    });
    let dir = tempdir().unwrap();

    f.promoter
        .export_shortcuts(&FsExportTarget::new(dir.path()))
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join(EXPORT_FILE_NAME)).unwrap(),
        ""
    );
}

#[test]
fn unknown_action_is_rejected() {
    let f = fixture();
    let dir = tempdir().unwrap();
    let err = f
        .promoter
        .run_action("reticulate", &FsExportTarget::new(dir.path()))
        .unwrap_err();
    assert!(matches!(err, KeyPromoterError::UnknownAction(_)));
    assert_eq!(
        f.promoter.actions().map(|a| a.name),
        ["Statistics", "Export hotkeys"]
    );
}

#[test]
fn invalid_setting_is_reported_and_not_applied() {
    let f = fixture();

    let err = f.promoter.set_setting("threshold", "many").unwrap_err();
    assert!(matches!(err, KeyPromoterError::InvalidSetting { .. }));
    assert_eq!(f.promoter.settings().threshold, 0);
    assert_eq!(f.notifier.drain()[0].message(), "please specify a valid number");

    f.promoter.set_setting("threshold", "2").unwrap();
    assert_eq!(f.promoter.settings().threshold, 2);
    assert_eq!(f.store.snapshot().unwrap()["threshold"], json!(2));

    f.promoter.reset_setting("threshold").unwrap();
    assert_eq!(f.store.snapshot().unwrap()["threshold"], json!(0));
}
