//! Persistence of settings and statistics
//!
//! The host offers a black-box key-value surface that reads and writes the
//! whole data document at once ([`DataStore`]). [`PersistedState`] is that
//! document: the settings plus both statistics maps, read at startup and
//! written back after every change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::statistics::StatisticsStore;

/// Whole-document persistence surface supplied by the host.
pub trait DataStore: Send + Sync {
    /// Read the stored document; `None` on first run.
    fn load_data(&self) -> Result<Option<Value>>;
    /// Replace the stored document.
    fn save_data(&self, data: &Value) -> Result<()>;
}

/// JSON file store using atomic writes (write temp + rename).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    file_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    /// Store at the default location (~/.key-promoter/data.json)
    pub fn with_default_path() -> Self {
        Self::new(default_data_path())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Get the default data file path
pub fn default_data_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.key-promoter/data.json").as_ref())
}

impl DataStore for JsonFileStore {
    #[instrument(name = "data_load", skip(self), fields(path = %self.file_path.display()))]
    fn load_data(&self) -> Result<Option<Value>> {
        if !self.file_path.exists() {
            info!("Data file not found, starting fresh");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read data file: {}", self.file_path.display()))?;
        let value: Value =
            serde_json::from_str(&content).with_context(|| "Failed to parse data JSON")?;
        Ok(Some(value))
    }

    #[instrument(name = "data_save", skip(self, data), fields(path = %self.file_path.display()))]
    fn save_data(&self, data: &Value) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;

        let temp_path = self.file_path.with_extension("json.tmp");
        std::fs::write(&temp_path, &json).with_context(|| {
            format!("Failed to write temp data file: {}", temp_path.display())
        })?;
        std::fs::rename(&temp_path, &self.file_path).with_context(|| {
            format!("Failed to rename temp file to {}", self.file_path.display())
        })?;

        debug!(bytes = json.len(), "Saved data (atomic)");
        Ok(())
    }
}

/// In-memory store, for embedding hosts that persist elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }

    /// Copy of the last saved document
    pub fn snapshot(&self) -> Option<Value> {
        self.data.lock().clone()
    }
}

impl DataStore for MemoryStore {
    fn load_data(&self) -> Result<Option<Value>> {
        Ok(self.data.lock().clone())
    }

    fn save_data(&self, data: &Value) -> Result<()> {
        *self.data.lock() = Some(data.clone());
        Ok(())
    }
}

/// The persisted data document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub settings: Settings,
    pub statistics: StatisticsStore,
}

impl PersistedState {
    /// Decode a document, filling every missing field with its default.
    pub fn from_value(value: Value) -> Result<Self> {
        let settings: Settings =
            serde_json::from_value(value.clone()).context("Failed to decode settings")?;
        let statistics: StatisticsStore =
            serde_json::from_value(value).context("Failed to decode statistics")?;
        Ok(Self {
            settings,
            statistics,
        })
    }

    /// Encode the document as one flat JSON object.
    pub fn to_value(&self) -> Result<Value> {
        let mut document = Map::new();
        for part in [
            serde_json::to_value(&self.settings).context("Failed to encode settings")?,
            serde_json::to_value(&self.statistics).context("Failed to encode statistics")?,
        ] {
            if let Value::Object(fields) = part {
                document.extend(fields);
            }
        }
        Ok(Value::Object(document))
    }

    /// Load from the store, starting from defaults when nothing is stored.
    pub fn load(store: &dyn DataStore) -> Result<Self> {
        match store.load_data()? {
            Some(value) => {
                let state = Self::from_value(value)?;
                info!(
                    pointer_entries = state.statistics.len(crate::statistics::Channel::Pointer),
                    keyboard_entries = state.statistics.len(crate::statistics::Channel::Keyboard),
                    "Loaded persisted state"
                );
                Ok(state)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn persist(&self, store: &dyn DataStore) -> Result<()> {
        store.save_data(&self.to_value()?)
    }
}
