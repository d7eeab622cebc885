//! Countdown engine
//!
//! Remaining time is always derived from an absolute target end timestamp and
//! the wall clock passed in by the caller, never from a decremented counter.
//! Every operation takes `now_ms` (epoch milliseconds) explicitly.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//!   ^                |                  |
//!   +---reset/complete+------reset-------+
//! ```

use thiserror::Error;

use super::timer_state::{
    Phase, StepMinutes, TimerConfig, TimerState, MAX_DURATION_MINUTES,
};

/// Direction for a step-sized duration change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

/// Rejected duration change. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustError {
    #[error("Maximum duration is {} minutes", MAX_DURATION_MINUTES)]
    Maximum,
    #[error("Minimum duration is {step} minutes")]
    Minimum { step: u32 },
    #[error("Duration must be between 1 and 60 minutes, got {0}")]
    OutOfRange(u32),
    #[error("Duration cannot change while the timer is running")]
    Active,
}

/// Owns the timer configuration and state and the rules for changing them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerEngine {
    config: TimerConfig,
    state: TimerState,
}

impl TimerEngine {
    pub fn new(config: TimerConfig, state: TimerState) -> Self {
        debug_assert!(state.check_invariant());
        Self { config, state }
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase(), Phase::Running { .. })
    }

    /// Begin or resume the countdown. Returns false if already running.
    pub fn start(&mut self, now_ms: i64) -> bool {
        let duration_ms = match self.phase() {
            Phase::Running { .. } => return false,
            Phase::Paused { remaining_ms } => remaining_ms,
            Phase::Idle => self.config.duration_ms(),
        };
        let target = now_ms.saturating_add(i64::try_from(duration_ms).unwrap_or(i64::MAX));
        self.state = TimerState::running(target);
        true
    }

    /// Freeze the remaining time. Returns false unless running.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        let Phase::Running { target_end_ms } = self.phase() else {
            return false;
        };
        self.state = TimerState::paused(remaining_until(target_end_ms, now_ms));
        true
    }

    /// Pause when running, start otherwise
    pub fn toggle(&mut self, now_ms: i64) -> Phase {
        if !self.pause(now_ms) {
            self.start(now_ms);
        }
        self.phase()
    }

    /// Drop any progress and return to the full configured duration
    pub fn reset(&mut self) {
        self.state = TimerState::idle();
    }

    /// Move the duration by one step. Any paused progress is discarded.
    pub fn adjust_duration(&mut self, direction: Direction) -> Result<u32, AdjustError> {
        if self.is_running() {
            return Err(AdjustError::Active);
        }

        let step = self.config.step_minutes.minutes();
        let current = self.config.duration_minutes;
        let updated = match direction {
            Direction::Increment => {
                if current + step > MAX_DURATION_MINUTES {
                    return Err(AdjustError::Maximum);
                }
                (current + step).min(MAX_DURATION_MINUTES)
            }
            Direction::Decrement => {
                if current < step * 2 {
                    return Err(AdjustError::Minimum { step });
                }
                (current - step).max(step)
            }
        };

        self.config.duration_minutes = updated;
        self.reset();
        Ok(updated)
    }

    /// Set the duration directly. Any paused progress is discarded.
    pub fn set_duration(&mut self, minutes: u32) -> Result<u32, AdjustError> {
        if self.is_running() {
            return Err(AdjustError::Active);
        }
        if !TimerConfig::is_valid_duration(minutes) {
            return Err(AdjustError::OutOfRange(minutes));
        }

        self.config.duration_minutes = minutes;
        self.reset();
        Ok(minutes)
    }

    pub fn set_step(&mut self, step: StepMinutes) {
        self.config.step_minutes = step;
    }

    /// Remaining time of a running countdown, `None` when not running
    pub fn tick(&self, now_ms: i64) -> Option<u64> {
        match self.phase() {
            Phase::Running { target_end_ms } => Some(remaining_until(target_end_ms, now_ms)),
            _ => None,
        }
    }

    /// Finish a countdown that reached zero.
    ///
    /// Returns true exactly once per run; the caller emits the completion
    /// side effects only in that case.
    pub fn complete(&mut self, now_ms: i64) -> bool {
        if self.tick(now_ms) != Some(0) {
            return false;
        }
        self.reset();
        true
    }

    /// Time to show for the current phase
    pub fn displayed_remaining_ms(&self, now_ms: i64) -> u64 {
        match self.phase() {
            Phase::Running { target_end_ms } => remaining_until(target_end_ms, now_ms),
            Phase::Paused { remaining_ms } => remaining_ms,
            Phase::Idle => self.config.duration_ms(),
        }
    }
}

fn remaining_until(target_end_ms: i64, now_ms: i64) -> u64 {
    u64::try_from(target_end_ms.saturating_sub(now_ms)).unwrap_or(0)
}
