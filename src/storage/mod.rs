//! Durable key-value persistence for timer state and preferences
//!
//! Every value lives under its own flat key so one malformed entry only
//! falls back to its own default.

pub mod file_store;
pub mod memory_store;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::{Preferences, StepMinutes, Theme, TimerConfig, TimerState};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

pub const KEY_DURATION_MINUTES: &str = "pomodoro-duration-minutes";
pub const KEY_STEP_MINUTES: &str = "pomodoro-step-minutes";
pub const KEY_IS_ACTIVE: &str = "pomodoro-is-active";
pub const KEY_TARGET_END_TIME: &str = "pomodoro-target-end-time";
pub const KEY_REMAINING_TIME: &str = "pomodoro-remaining-time";
pub const KEY_THEME: &str = "pomodoro-theme";
pub const KEY_FONT_INDEX: &str = "pomodoro-font-index";
pub const KEY_FONT_SIZE_PERCENT: &str = "pomodoro-font-size-percent";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence collaborator for the timer.
///
/// Loading never fails; anything missing or unreadable becomes a default.
pub trait TimerStore: Send + Sync {
    fn load(&self) -> (TimerConfig, TimerState);

    fn save(&self, config: &TimerConfig, state: &TimerState) -> Result<(), StorageError>;

    fn load_preferences(&self) -> Preferences;

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError>;
}

fn read_key<T: DeserializeOwned>(entries: &Map<String, Value>, key: &str) -> Option<T> {
    let value = entries.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring malformed value for {}: {}", key, e);
            None
        }
    }
}

/// Build config and state from stored entries, repairing what is invalid
pub fn timer_from_entries(entries: &Map<String, Value>) -> (TimerConfig, TimerState) {
    let defaults = TimerConfig::default();

    let duration_minutes = read_key::<u32>(entries, KEY_DURATION_MINUTES)
        .filter(|minutes| TimerConfig::is_valid_duration(*minutes))
        .unwrap_or(defaults.duration_minutes);
    let step_minutes = read_key::<u32>(entries, KEY_STEP_MINUTES)
        .and_then(StepMinutes::from_minutes)
        .unwrap_or(defaults.step_minutes);

    let is_active = read_key::<bool>(entries, KEY_IS_ACTIVE).unwrap_or(false);
    let target_end = read_key::<Option<i64>>(entries, KEY_TARGET_END_TIME).flatten();
    let remaining = read_key::<Option<u64>>(entries, KEY_REMAINING_TIME).flatten();

    let (state, repaired) = TimerState::from_parts(is_active, target_end, remaining);
    if repaired {
        warn!(
            "Stored timer state was inconsistent (active={}, target={:?}, remaining={:?}), using {}",
            is_active,
            target_end,
            remaining,
            state.phase().name()
        );
    }
    debug!(
        "Loaded timer: {}min, step {}, {}",
        duration_minutes,
        step_minutes,
        state.phase().name()
    );

    (TimerConfig::new(duration_minutes, step_minutes), state)
}

/// Write config and state into stored entries, leaving other keys alone
pub fn timer_into_entries(
    entries: &mut Map<String, Value>,
    config: &TimerConfig,
    state: &TimerState,
) {
    entries.insert(KEY_DURATION_MINUTES.into(), config.duration_minutes.into());
    entries.insert(KEY_STEP_MINUTES.into(), config.step_minutes.minutes().into());
    entries.insert(KEY_IS_ACTIVE.into(), state.is_active().into());
    entries.insert(
        KEY_TARGET_END_TIME.into(),
        state.target_end_time_ms().map_or(Value::Null, Value::from),
    );
    entries.insert(
        KEY_REMAINING_TIME.into(),
        state.remaining_time_ms().map_or(Value::Null, Value::from),
    );
}

pub fn preferences_from_entries(entries: &Map<String, Value>) -> Preferences {
    let defaults = Preferences::default();
    Preferences {
        theme: read_key::<Theme>(entries, KEY_THEME).unwrap_or(defaults.theme),
        font_index: read_key(entries, KEY_FONT_INDEX).unwrap_or(defaults.font_index),
        font_size_percent: read_key(entries, KEY_FONT_SIZE_PERCENT)
            .unwrap_or(defaults.font_size_percent),
    }
    .clamped()
}

pub fn preferences_into_entries(entries: &mut Map<String, Value>, preferences: &Preferences) {
    entries.insert(KEY_THEME.into(), serde_json::json!(preferences.theme));
    entries.insert(KEY_FONT_INDEX.into(), preferences.font_index.into());
    entries.insert(
        KEY_FONT_SIZE_PERCENT.into(),
        preferences.font_size_percent.into(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn empty_entries_give_defaults() {
        let (config, state) = timer_from_entries(&Map::new());
        assert_eq!(config, TimerConfig::default());
        assert_eq!(state, TimerState::idle());
        assert_eq!(preferences_from_entries(&Map::new()), Preferences::default());
    }

    #[test]
    fn malformed_values_fall_back_per_key() {
        let stored = entries(json!({
            KEY_DURATION_MINUTES: "forty",
            KEY_STEP_MINUTES: 10,
            KEY_IS_ACTIVE: false,
            KEY_REMAINING_TIME: 90_000,
        }));
        let (config, state) = timer_from_entries(&stored);
        assert_eq!(config.duration_minutes, 25);
        assert_eq!(config.step_minutes, StepMinutes::Ten);
        assert_eq!(state, TimerState::paused(90_000));
    }

    #[test]
    fn out_of_range_values_use_defaults() {
        let stored = entries(json!({
            KEY_DURATION_MINUTES: 75,
            KEY_STEP_MINUTES: 3,
            KEY_FONT_SIZE_PERCENT: 5,
        }));
        let (config, _) = timer_from_entries(&stored);
        assert_eq!(config, TimerConfig::default());
        assert_eq!(preferences_from_entries(&stored).font_size_percent, 20);
    }

    #[test]
    fn both_time_fields_set_keeps_running_target() {
        let stored = entries(json!({
            KEY_IS_ACTIVE: true,
            KEY_TARGET_END_TIME: 1_700_000_000_000i64,
            KEY_REMAINING_TIME: 5_000,
        }));
        let (_, state) = timer_from_entries(&stored);
        assert_eq!(state, TimerState::running(1_700_000_000_000));
        assert!(state.check_invariant());
    }

    #[test]
    fn writing_keeps_unrelated_keys() {
        let mut stored = entries(json!({ KEY_THEME: "light", "other": 1 }));
        let config = TimerConfig::new(40, StepMinutes::Ten);
        timer_into_entries(&mut stored, &config, &TimerState::running(123));

        assert_eq!(stored[KEY_THEME], json!("light"));
        assert_eq!(stored["other"], json!(1));
        assert_eq!(stored[KEY_DURATION_MINUTES], json!(40));
        assert_eq!(stored[KEY_STEP_MINUTES], json!(10));
        assert_eq!(stored[KEY_IS_ACTIVE], json!(true));
        assert_eq!(stored[KEY_TARGET_END_TIME], json!(123));
        assert_eq!(stored[KEY_REMAINING_TIME], Value::Null);

        let (loaded_config, loaded_state) = timer_from_entries(&stored);
        assert_eq!(loaded_config, config);
        assert_eq!(loaded_state, TimerState::running(123));
        assert_eq!(preferences_from_entries(&stored).theme, Theme::Light);
    }
}
