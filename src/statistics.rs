//! Per-channel usage statistics
//!
//! Counts how often each command was evoked, kept separately for the
//! pointer and keyboard channels. Counts only grow within a session; the
//! store is persisted as part of the data document (see
//! [`crate::storage::PersistedState`]) after every mutation.
//!
//! The store performs no deduplication. Exactly-once recording is the
//! caller's job (see [`crate::interceptor`]).

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::CommandCatalog;

/// Interaction modality that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Pointer,
    Keyboard,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Pointer, Channel::Keyboard];

    /// Heading used in reports
    pub fn label(self) -> &'static str {
        match self {
            Channel::Pointer => "Mouse",
            Channel::Keyboard => "Keyboard",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Command id -> invocation count, one map per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsStore {
    #[serde(default, alias = "mouseStatistics")]
    pointer_statistics: BTreeMap<String, u64>,
    #[serde(default)]
    keyboard_statistics: BTreeMap<String, u64>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, channel: Channel) -> &BTreeMap<String, u64> {
        match channel {
            Channel::Pointer => &self.pointer_statistics,
            Channel::Keyboard => &self.keyboard_statistics,
        }
    }

    fn map_mut(&mut self, channel: Channel) -> &mut BTreeMap<String, u64> {
        match channel {
            Channel::Pointer => &mut self.pointer_statistics,
            Channel::Keyboard => &mut self.keyboard_statistics,
        }
    }

    /// Increment the count for a command, initializing it to 1.
    ///
    /// Returns the new count.
    pub fn record(&mut self, channel: Channel, command_id: &str) -> u64 {
        let count = self
            .map_mut(channel)
            .entry(command_id.to_string())
            .and_modify(|count| *count = count.saturating_add(1))
            .or_insert(1);
        let count = *count;
        debug!(
            channel = %channel,
            command_id = command_id,
            count,
            "Recorded command usage"
        );
        count
    }

    /// Count for a command; 0 if it was never observed on this channel.
    pub fn count(&self, channel: Channel, command_id: &str) -> u64 {
        self.map(channel).get(command_id).copied().unwrap_or(0)
    }

    /// Raw counts for a channel.
    pub fn counts(&self, channel: Channel) -> &BTreeMap<String, u64> {
        self.map(channel)
    }

    /// Counts for a channel sorted by:
    /// 1. Count descending
    /// 2. Catalog enumeration order
    /// 3. Id ascending, for ids the catalog no longer knows
    pub fn ranked_by_count(
        &self,
        channel: Channel,
        catalog: &dyn CommandCatalog,
    ) -> Vec<(String, u64)> {
        let positions: HashMap<&str, usize> = catalog
            .commands()
            .enumerate()
            .map(|(index, command)| (command.id.as_str(), index))
            .collect();

        let mut items: Vec<(&String, u64, Option<usize>)> = self
            .map(channel)
            .iter()
            .map(|(id, &count)| (id, count, positions.get(id.as_str()).copied()))
            .collect();

        items.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| match (a.2, b.2) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.0.cmp(b.0))
        });

        items
            .into_iter()
            .map(|(id, count, _)| (id.clone(), count))
            .collect()
    }

    /// Number of commands observed on a channel.
    pub fn len(&self, channel: Channel) -> usize {
        self.map(channel).len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointer_statistics.is_empty() && self.keyboard_statistics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Command, InMemoryCatalog};

    fn catalog() -> InMemoryCatalog {
        [
            Command::new("a", "Close pane"),
            Command::new("b", "Close all panes"),
            Command::new("c", "Open settings"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn record_initializes_then_increments() {
        let mut store = StatisticsStore::new();
        assert_eq!(store.record(Channel::Pointer, "a"), 1);
        assert_eq!(store.record(Channel::Pointer, "a"), 2);
        assert_eq!(store.count(Channel::Pointer, "a"), 2);
        assert_eq!(store.count(Channel::Pointer, "missing"), 0);
    }

    #[test]
    fn channels_are_independent() {
        let mut store = StatisticsStore::new();
        store.record(Channel::Pointer, "a");
        store.record(Channel::Keyboard, "b");

        assert_eq!(store.count(Channel::Keyboard, "a"), 0);
        assert_eq!(store.count(Channel::Pointer, "b"), 0);
        assert_eq!(store.len(Channel::Pointer), 1);
        assert_eq!(store.len(Channel::Keyboard), 1);
    }

    #[test]
    fn ranked_by_count_descending() {
        let mut store = StatisticsStore::new();
        store.record(Channel::Pointer, "a");
        store.record(Channel::Pointer, "c");
        store.record(Channel::Pointer, "c");

        let ranked = store.ranked_by_count(Channel::Pointer, &catalog());
        assert_eq!(
            ranked,
            vec![("c".to_string(), 2), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn ties_follow_catalog_order() {
        let catalog: InMemoryCatalog = [
            Command::new("zeta", "Z"),
            Command::new("alpha", "A"),
        ]
        .into_iter()
        .collect();
        let mut store = StatisticsStore::new();
        store.record(Channel::Keyboard, "alpha");
        store.record(Channel::Keyboard, "zeta");
        store.record(Channel::Keyboard, "gone");

        let ranked: Vec<String> = store
            .ranked_by_count(Channel::Keyboard, &catalog)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ranked, vec!["zeta", "alpha", "gone"]);
    }

    #[test]
    fn reads_legacy_field_names() {
        let json = r#"{"mouseStatistics": {"a": 3}, "keyboardStatistics": {"b": 1}}"#;
        let store: StatisticsStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.count(Channel::Pointer, "a"), 3);
        assert_eq!(store.count(Channel::Keyboard, "b"), 1);
    }

    #[test]
    fn serde_roundtrip_preserves_ranking() {
        let mut store = StatisticsStore::new();
        store.record(Channel::Pointer, "b");
        store.record(Channel::Pointer, "a");
        store.record(Channel::Pointer, "a");
        store.record(Channel::Keyboard, "c");

        let json = serde_json::to_value(&store).unwrap();
        let loaded: StatisticsStore = serde_json::from_value(json).unwrap();

        assert_eq!(loaded, store);
        for channel in Channel::ALL {
            assert_eq!(
                loaded.ranked_by_count(channel, &catalog()),
                store.ranked_by_count(channel, &catalog())
            );
        }
    }
}
