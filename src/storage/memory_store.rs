//! In-process store

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use serde_json::{Map, Value};

use super::{
    preferences_from_entries, preferences_into_entries, timer_from_entries, timer_into_entries,
    StorageError, TimerStore,
};
use crate::state::{Preferences, TimerConfig, TimerState};

/// Keeps entries in memory. Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn entries(&self) -> Map<String, Value> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn update<F>(&self, updater: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("store lock poisoned: {}", e)))?;
        updater(&mut entries);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl TimerStore for MemoryStore {
    fn load(&self) -> (TimerConfig, TimerState) {
        timer_from_entries(&self.entries())
    }

    fn save(&self, config: &TimerConfig, state: &TimerState) -> Result<(), StorageError> {
        self.update(|entries| timer_into_entries(entries, config, state))
    }

    fn load_preferences(&self) -> Preferences {
        preferences_from_entries(&self.entries())
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        self.update(|entries| preferences_into_entries(entries, preferences))
    }
}
