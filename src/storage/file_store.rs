//! JSON file backed store

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{
    preferences_from_entries, preferences_into_entries, timer_from_entries, timer_into_entries,
    StorageError, TimerStore,
};
use crate::state::{Preferences, TimerConfig, TimerState};

/// Stores all keys as one flat JSON object on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(entries) => Ok(entries),
            other => Err(StorageError::Unavailable(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }

    /// Entries for loading; unreadable storage is treated as empty
    fn entries_or_empty(&self) -> Map<String, Value> {
        self.read_entries().unwrap_or_else(|e| {
            warn!("Failed to read {}: {}, using defaults", self.path.display(), e);
            Map::new()
        })
    }

    fn update<F>(&self, updater: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("store lock poisoned: {}", e)))?;

        let mut entries = self.entries_or_empty();
        updater(&mut entries);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let serialized = serde_json::to_string_pretty(&Value::Object(entries))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Persisted state to {}", self.path.display());
        Ok(())
    }
}

impl TimerStore for FileStore {
    fn load(&self) -> (TimerConfig, TimerState) {
        timer_from_entries(&self.entries_or_empty())
    }

    fn save(&self, config: &TimerConfig, state: &TimerState) -> Result<(), StorageError> {
        self.update(|entries| timer_into_entries(entries, config, state))
    }

    fn load_preferences(&self) -> Preferences {
        preferences_from_entries(&self.entries_or_empty())
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        self.update(|entries| preferences_into_entries(entries, preferences))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
