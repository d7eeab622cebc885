//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Preferences, StepMinutes, TimerSnapshot};

/// API response structure for timer operations
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create a response for an applied operation
    pub fn ok(message: String, timer: TimerSnapshot) -> Self {
        Self::new("ok".to_string(), message, timer)
    }

    /// Create a response for a refused operation
    pub fn rejected(message: String, timer: TimerSnapshot) -> Self {
        Self::new("rejected".to_string(), message, timer)
    }
}

/// Timer status with session information
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub toast: Option<String>,
    pub preferences: Preferences,
    pub uptime: String,
    pub save_failures: u64,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `PUT /duration`
#[derive(Debug, Clone, Deserialize)]
pub struct DurationRequest {
    pub minutes: u32,
}

/// Body of `PUT /step`
#[derive(Debug, Clone, Deserialize)]
pub struct StepRequest {
    pub minutes: StepMinutes,
}
