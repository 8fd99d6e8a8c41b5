//! Read-only view over the host's command catalog.
//!
//! The host owns its commands and any user-customized shortcut overrides.
//! This module only reads them through the [`CommandCatalog`] trait, so
//! the engine can run against the real host or an in-memory fake.
//!
//! [`InMemoryCatalog`] keeps insertion order for deterministic enumeration
//! and a HashMap index for O(1) lookup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::shortcuts::Shortcut;

/// A command registered with the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Unique, stable across sessions
    pub id: String,
    /// Human label, not unique
    pub name: String,
    /// Statically declared shortcuts
    #[serde(default, alias = "hotkeys")]
    pub shortcuts: Vec<Shortcut>,
}

impl Command {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shortcuts: Vec::new(),
        }
    }

    pub fn with_shortcut(mut self, shortcut: Shortcut) -> Self {
        self.shortcuts.push(shortcut);
        self
    }
}

/// Capability over the host's registered commands.
pub trait CommandCatalog: Send + Sync {
    /// Look up a command by id.
    fn lookup(&self, id: &str) -> Option<&Command>;

    /// Enumerate every command in catalog order.
    ///
    /// The sequence reflects the catalog at call time and is not
    /// restartable across catalog mutation.
    fn commands(&self) -> Box<dyn Iterator<Item = &Command> + '_>;

    /// User-customized shortcuts for a command, if the host recorded any.
    ///
    /// `Some(&[])` means the user removed every shortcut.
    fn shortcut_overrides(&self, id: &str) -> Option<&[Shortcut]>;

    /// Shortcuts in effect for a command: overrides win over declared ones.
    fn effective_shortcuts<'a>(&'a self, command: &'a Command) -> &'a [Shortcut] {
        match self.shortcut_overrides(&command.id) {
            Some(overrides) => overrides,
            None => &command.shortcuts,
        }
    }
}

/// Catalog as the host exports it.
///
/// App commands and editor commands are kept apart by the host; the
/// catalog merges them with app commands first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub editor_commands: Vec<Command>,
    /// Map of command id -> user-customized shortcuts
    #[serde(default)]
    pub custom_keys: HashMap<String, Vec<Shortcut>>,
}

/// In-memory catalog with deterministic enumeration order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    commands: Vec<Command>,
    id_to_index: HashMap<String, usize>,
    overrides: HashMap<String, Vec<Shortcut>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a host snapshot, de-duplicating by id.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut catalog = Self::new();
        for command in snapshot
            .commands
            .into_iter()
            .chain(snapshot.editor_commands)
        {
            if catalog.lookup(&command.id).is_some() {
                debug!(command_id = %command.id, "Skipping duplicate catalog entry");
                continue;
            }
            catalog.register(command);
        }
        for (id, shortcuts) in snapshot.custom_keys {
            catalog.set_override(id, shortcuts);
        }
        catalog
    }

    /// Load a host snapshot from a JSON file.
    #[instrument(name = "catalog_load")]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let snapshot: CatalogSnapshot =
            serde_json::from_str(&content).with_context(|| "Failed to parse catalog JSON")?;
        let catalog = Self::from_snapshot(snapshot);
        info!(
            path = %path.display(),
            command_count = catalog.len(),
            override_count = catalog.overrides.len(),
            "Loaded command catalog"
        );
        Ok(catalog)
    }

    /// Register a command, replacing any command with the same id in place.
    pub fn register(&mut self, command: Command) {
        if let Some(&existing_index) = self.id_to_index.get(&command.id) {
            self.commands[existing_index] = command;
        } else {
            let index = self.commands.len();
            self.id_to_index.insert(command.id.clone(), index);
            self.commands.push(command);
        }
    }

    pub fn set_override(&mut self, id: impl Into<String>, shortcuts: Vec<Shortcut>) {
        self.overrides.insert(id.into(), shortcuts);
    }

    pub fn clear_override(&mut self, id: &str) {
        self.overrides.remove(id);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<Command> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for command in iter {
            catalog.register(command);
        }
        catalog
    }
}

impl CommandCatalog for InMemoryCatalog {
    fn lookup(&self, id: &str) -> Option<&Command> {
        self.id_to_index.get(id).and_then(|&i| self.commands.get(i))
    }

    fn commands(&self) -> Box<dyn Iterator<Item = &Command> + '_> {
        Box::new(self.commands.iter())
    }

    fn shortcut_overrides(&self, id: &str) -> Option<&[Shortcut]> {
        self.overrides.get(id).map(Vec::as_slice)
    }
}
