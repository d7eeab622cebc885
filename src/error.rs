//! Error types surfaced by timer operations

use thiserror::Error;

use crate::state::AdjustError;

#[derive(Debug, Error)]
pub enum TimerError {
    /// A duration change was refused; the message is meant for the user
    #[error(transparent)]
    Adjust(#[from] AdjustError),

    #[error("Failed to lock {0}")]
    Lock(&'static str),
}

impl TimerError {
    /// User-facing text for rejected adjustments
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Adjust(e) => Some(e.to_string()),
            Self::Lock(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;
