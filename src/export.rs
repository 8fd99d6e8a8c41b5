//! Templated bulk export of the command catalog
//!
//! Each command contributes one copy of the line template with its
//! `{{commandId}}`, `{{commandName}}` and `{{hotkey}}` placeholders
//! substituted literally. No escaping is applied.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::CommandCatalog;
use crate::error::{KeyPromoterError, Result};
use crate::shortcuts::{format_shortcuts, join_hotkeys, Platform};

pub const PLACEHOLDER_COMMAND_ID: &str = "{{commandId}}";
pub const PLACEHOLDER_COMMAND_NAME: &str = "{{commandName}}";
pub const PLACEHOLDER_HOTKEY: &str = "{{hotkey}}";

/// Which commands take part in the export.
///
/// Excluding both kinds yields an empty export; that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFilter {
    pub include_assigned: bool,
    pub include_unassigned: bool,
}

impl Default for ExportFilter {
    fn default() -> Self {
        Self {
            include_assigned: true,
            include_unassigned: true,
        }
    }
}

impl ExportFilter {
    pub fn includes(&self, assigned: bool) -> bool {
        if assigned {
            self.include_assigned
        } else {
            self.include_unassigned
        }
    }

    /// True when no command can ever be exported.
    pub fn excludes_everything(&self) -> bool {
        !self.include_assigned && !self.include_unassigned
    }
}

/// Substitute every placeholder occurrence in one template copy.
pub fn render_template(template: &str, command_id: &str, command_name: &str, hotkey: &str) -> String {
    template
        .replace(PLACEHOLDER_COMMAND_ID, command_id)
        .replace(PLACEHOLDER_COMMAND_NAME, command_name)
        .replace(PLACEHOLDER_HOTKEY, hotkey)
}

/// Render the whole catalog, in catalog order.
///
/// Commands without shortcuts render `unassigned_marker` in place of the
/// hotkey.
pub fn render_export(
    catalog: &dyn CommandCatalog,
    template: &str,
    filter: ExportFilter,
    platform: Platform,
    unassigned_marker: &str,
) -> String {
    let mut content = String::new();
    for command in catalog.commands() {
        let shortcuts = catalog.effective_shortcuts(command);
        if !filter.includes(!shortcuts.is_empty()) {
            continue;
        }
        let hotkey = if shortcuts.is_empty() {
            unassigned_marker.to_string()
        } else {
            join_hotkeys(&format_shortcuts(shortcuts, platform))
        };
        content.push_str(&render_template(template, &command.id, &command.name, &hotkey));
    }
    content
}

/// The host's file-write surface.
pub trait ExportTarget: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Create `path` with `content`; fails if the path already exists.
    fn create(&self, path: &Path, content: &str) -> Result<()>;
}

/// Writes exports below a root directory.
#[derive(Debug, Clone)]
pub struct FsExportTarget {
    root: PathBuf,
}

impl FsExportTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl ExportTarget for FsExportTarget {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn create(&self, path: &Path, content: &str) -> Result<()> {
        let full_path = self.resolve(path);
        let io_error = |source| KeyPromoterError::Io {
            path: full_path.clone(),
            source,
        };

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::AlreadyExists {
                    debug!(path = %full_path.display(), "Export target already exists");
                    KeyPromoterError::ExportTargetExists {
                        path: path.to_path_buf(),
                    }
                } else {
                    io_error(source)
                }
            })?;
        file.write_all(content.as_bytes()).map_err(io_error)?;

        info!(path = %full_path.display(), bytes = content.len(), "Wrote export file");
        Ok(())
    }
}
