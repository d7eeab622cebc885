//! Timer configuration and state structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds per configured minute
pub const MS_PER_MINUTE: u64 = 60_000;

/// Longest focus length a user can configure
pub const MAX_DURATION_MINUTES: u32 = 60;

/// Shortest focus length reachable through the duration setting
pub const MIN_DURATION_MINUTES: u32 = 1;

pub const DEFAULT_DURATION_MINUTES: u32 = 25;

/// Increment/decrement granularity for duration adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum StepMinutes {
    One,
    Five,
    Ten,
    Fifteen,
}

impl StepMinutes {
    pub const ALL: [StepMinutes; 4] = [Self::One, Self::Five, Self::Ten, Self::Fifteen];

    pub fn minutes(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Five => 5,
            Self::Ten => 10,
            Self::Fifteen => 15,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.minutes() == minutes)
    }
}

impl Default for StepMinutes {
    fn default() -> Self {
        Self::Five
    }
}

impl TryFrom<u32> for StepMinutes {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
            .ok_or_else(|| format!("step must be one of 1, 5, 10 or 15 minutes, got {}", minutes))
    }
}

impl From<StepMinutes> for u32 {
    fn from(step: StepMinutes) -> Self {
        step.minutes()
    }
}

impl fmt::Display for StepMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// Persisted duration settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub duration_minutes: u32,
    pub step_minutes: StepMinutes,
}

impl TimerConfig {
    pub fn new(duration_minutes: u32, step_minutes: StepMinutes) -> Self {
        Self {
            duration_minutes,
            step_minutes,
        }
    }

    /// Full configured duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration_minutes) * MS_PER_MINUTE
    }

    pub fn is_valid_duration(minutes: u32) -> bool {
        (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES, StepMinutes::default())
    }
}

/// Where the timer currently sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Paused { remaining_ms: u64 },
    Running { target_end_ms: i64 },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Paused { .. } => "paused",
            Self::Running { .. } => "running",
        }
    }
}

/// Persisted countdown state.
///
/// Fields are only written by the engine. At most one of the two time fields
/// is set, and `is_active` holds exactly when the target end time is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    pub(crate) is_active: bool,
    pub(crate) target_end_time_ms: Option<i64>,
    pub(crate) remaining_time_ms: Option<u64>,
}

impl TimerState {
    /// Fresh state: not active, full duration, nothing paused
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running(target_end_time_ms: i64) -> Self {
        Self {
            is_active: true,
            target_end_time_ms: Some(target_end_time_ms),
            remaining_time_ms: None,
        }
    }

    pub fn paused(remaining_time_ms: u64) -> Self {
        Self {
            is_active: false,
            target_end_time_ms: None,
            remaining_time_ms: Some(remaining_time_ms),
        }
    }

    /// Rebuild a state from raw persisted fields, repairing inconsistent
    /// combinations. The second value reports whether a repair happened.
    pub fn from_parts(
        is_active: bool,
        target_end_time_ms: Option<i64>,
        remaining_time_ms: Option<u64>,
    ) -> (Self, bool) {
        let state = match (is_active, target_end_time_ms, remaining_time_ms) {
            (true, Some(target), _) => Self::running(target),
            (false, None, Some(remaining)) => Self::paused(remaining),
            (false, Some(_), Some(remaining)) => Self::paused(remaining),
            _ => Self::idle(),
        };
        let repaired = state.is_active != is_active
            || state.target_end_time_ms != target_end_time_ms
            || state.remaining_time_ms != remaining_time_ms;
        (state, repaired)
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn target_end_time_ms(&self) -> Option<i64> {
        self.target_end_time_ms
    }

    pub fn remaining_time_ms(&self) -> Option<u64> {
        self.remaining_time_ms
    }

    pub fn phase(&self) -> Phase {
        match (self.target_end_time_ms, self.remaining_time_ms) {
            (Some(target_end_ms), _) => Phase::Running { target_end_ms },
            (None, Some(remaining_ms)) => Phase::Paused { remaining_ms },
            (None, None) => Phase::Idle,
        }
    }

    /// Whether the two time fields and the active flag agree
    pub fn check_invariant(&self) -> bool {
        let exclusive = !(self.target_end_time_ms.is_some() && self.remaining_time_ms.is_some());
        exclusive && self.is_active == self.target_end_time_ms.is_some()
    }
}

/// Format milliseconds as `MM:SS`, flooring to whole seconds
pub fn format_time(total_ms: u64) -> String {
    let total_seconds = total_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
