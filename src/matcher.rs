//! Label-to-command matching.
//!
//! UI text is frequently a shortened paraphrase of the full command name
//! (a button labeled "Close" runs "Close active pane"), so a command is a
//! candidate when its case-folded name *contains* the case-folded label.
//! No ranking beyond that test is performed; candidates keep catalog order.

use tracing::debug;

use crate::catalog::{Command, CommandCatalog};

/// Result of matching one interaction label against the catalog.
#[derive(Debug, PartialEq, Eq)]
pub enum LabelMatch<'c> {
    /// The label was empty after trimming; nothing was matched.
    EmptyLabel,
    /// More candidates than the threshold allows. Callers must not
    /// process any of them.
    Ambiguous { candidates: usize, threshold: usize },
    /// Every command evoked by the label, in catalog order (may be empty).
    Candidates(Vec<&'c Command>),
}

impl<'c> LabelMatch<'c> {
    /// Candidates safe to process; empty for rejected matches.
    pub fn candidates(&self) -> &[&'c Command] {
        match self {
            LabelMatch::Candidates(commands) => commands,
            LabelMatch::EmptyLabel | LabelMatch::Ambiguous { .. } => &[],
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LabelMatch::Ambiguous { .. })
    }
}

/// Match a label against every command in the catalog.
///
/// `threshold == 0` means unbounded. When the candidate count exceeds a
/// positive threshold the whole match is rejected rather than truncated.
pub fn match_label<'c>(
    label: &str,
    catalog: &'c dyn CommandCatalog,
    threshold: usize,
) -> LabelMatch<'c> {
    let needle = label.trim().to_lowercase();
    if needle.is_empty() {
        return LabelMatch::EmptyLabel;
    }

    let candidates: Vec<&Command> = catalog
        .commands()
        .filter(|command| command.name.to_lowercase().contains(&needle))
        .collect();

    if threshold != 0 && candidates.len() > threshold {
        debug!(
            label = %needle,
            candidates = candidates.len(),
            threshold,
            "Rejecting ambiguous label match"
        );
        return LabelMatch::Ambiguous {
            candidates: candidates.len(),
            threshold,
        };
    }

    LabelMatch::Candidates(candidates)
}
