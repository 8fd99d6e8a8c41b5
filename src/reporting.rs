//! Ranked usage report ("Most used commands")
//!
//! One table per channel: usage count, command name and the command's
//! effective shortcuts, in ranked order. Ids the catalog no longer knows
//! (deleted commands, stale entries) are skipped.

use std::fmt::Write;

use crate::catalog::CommandCatalog;
use crate::shortcuts::{format_shortcuts, join_hotkeys, Platform};
use crate::statistics::{Channel, StatisticsStore};

/// One command in a channel table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub count: u64,
    pub command_id: String,
    pub command_name: String,
    /// Rendered effective shortcuts; empty when unassigned
    pub hotkeys: Vec<String>,
}

impl ReportRow {
    pub fn hotkey_cell(&self, unassigned_marker: &str) -> String {
        if self.hotkeys.is_empty() {
            unassigned_marker.to_string()
        } else {
            join_hotkeys(&self.hotkeys)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: Channel,
    pub rows: Vec<ReportRow>,
}

impl ChannelReport {
    pub fn build(
        channel: Channel,
        store: &StatisticsStore,
        catalog: &dyn CommandCatalog,
        platform: Platform,
    ) -> Self {
        let rows = store
            .ranked_by_count(channel, catalog)
            .into_iter()
            .filter_map(|(id, count)| {
                let Some(command) = catalog.lookup(&id) else {
                    tracing::debug!(command_id = %id, channel = %channel, "Skipping unknown command in report");
                    return None;
                };
                Some(ReportRow {
                    count,
                    command_id: command.id.clone(),
                    command_name: command.name.clone(),
                    hotkeys: format_shortcuts(catalog.effective_shortcuts(command), platform),
                })
            })
            .collect();
        Self { channel, rows }
    }
}

/// Report over both channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsReport {
    pub pointer: ChannelReport,
    pub keyboard: ChannelReport,
}

impl StatisticsReport {
    pub fn build(store: &StatisticsStore, catalog: &dyn CommandCatalog, platform: Platform) -> Self {
        Self {
            pointer: ChannelReport::build(Channel::Pointer, store, catalog, platform),
            keyboard: ChannelReport::build(Channel::Keyboard, store, catalog, platform),
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelReport {
        match channel {
            Channel::Pointer => &self.pointer,
            Channel::Keyboard => &self.keyboard,
        }
    }

    /// Plain-text rendering with aligned columns.
    pub fn render_text(&self, unassigned_marker: &str) -> String {
        let mut out = String::from("Most used commands\n");
        for channel in Channel::ALL {
            let report = self.channel(channel);
            let cells: Vec<[String; 3]> = report
                .rows
                .iter()
                .map(|row| {
                    [
                        row.count.to_string(),
                        row.command_name.clone(),
                        row.hotkey_cell(unassigned_marker),
                    ]
                })
                .collect();

            let header = ["Usage Count", "Command", "Hotkey"];
            let mut widths = header.map(str::len);
            for row in &cells {
                for (width, cell) in widths.iter_mut().zip(row) {
                    *width = (*width).max(cell.chars().count());
                }
            }

            let _ = writeln!(out, "\n{}", channel.label());
            let _ = writeln!(
                out,
                "{:<w0$}  {:<w1$}  {}",
                header[0],
                header[1],
                header[2],
                w0 = widths[0],
                w1 = widths[1]
            );
            for row in &cells {
                let line = format!(
                    "{:>w0$}  {:<w1$}  {}",
                    row[0],
                    row[1],
                    row[2],
                    w0 = widths[0],
                    w1 = widths[1]
                );
                let _ = writeln!(out, "{}", line.trim_end());
            }
        }
        out
    }
}
