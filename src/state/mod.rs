//! State management module
//!
//! This module contains the timer engine, its persisted structures and the
//! shared application state that owns them.

pub mod app_state;
pub mod engine;
pub mod preferences;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Collaborators, TimerSnapshot};
pub use engine::{AdjustError, Direction, TimerEngine};
pub use preferences::{Preferences, PreferencesUpdate, Theme};
pub use timer_state::{format_time, Phase, StepMinutes, TimerConfig, TimerState};
