//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info};

use super::responses::{ApiResponse, DurationRequest, HealthResponse, StatusResponse, StepRequest};
use crate::{
    error::TimerError,
    state::{AppState, Direction, Preferences, PreferencesUpdate, TimerSnapshot},
};

type TimerReply = Result<(StatusCode, Json<ApiResponse>), StatusCode>;

/// Turn an operation result into a reply; refusals become 409 with the
/// user-facing message
fn reply(state: &AppState, result: Result<TimerSnapshot, TimerError>, message: &str) -> TimerReply {
    match result {
        Ok(snapshot) => Ok((
            StatusCode::OK,
            Json(ApiResponse::ok(message.to_string(), snapshot)),
        )),
        Err(e) => match e.user_message() {
            Some(user_message) => {
                info!("Request rejected: {}", user_message);
                let snapshot = state.snapshot().map_err(|e| {
                    error!("Failed to read timer: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?;
                Ok((
                    StatusCode::CONFLICT,
                    Json(ApiResponse::rejected(user_message, snapshot)),
                ))
            }
            None => {
                error!("Timer operation failed: {}", e);
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
    }
}

/// Handle POST /start - Begin or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    reply(&state, state.start(), "Timer running")
}

/// Handle POST /pause - Freeze the remaining time
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    reply(&state, state.pause(), "Timer paused")
}

/// Handle POST /toggle - Pause if running, start otherwise
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    let result = state.toggle();
    let message = match &result {
        Ok(snapshot) if snapshot.is_active => "Timer running",
        _ => "Timer paused",
    };
    reply(&state, result, message)
}

/// Handle POST /reset - Back to the full duration
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    reply(&state, state.reset(), "Timer reset")
}

/// Handle POST /increment - Add one step to the duration
pub async fn increment_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    reply(
        &state,
        state.adjust_duration(Direction::Increment),
        "Duration increased",
    )
}

/// Handle POST /decrement - Remove one step from the duration
pub async fn decrement_handler(State(state): State<Arc<AppState>>) -> TimerReply {
    reply(
        &state,
        state.adjust_duration(Direction::Decrement),
        "Duration decreased",
    )
}

/// Handle PUT /duration - Set the duration directly
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DurationRequest>,
) -> TimerReply {
    reply(&state, state.set_duration(request.minutes), "Duration updated")
}

/// Handle PUT /step - Change the adjustment step
pub async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StepRequest>,
) -> TimerReply {
    reply(&state, state.set_step(request.minutes), "Step updated")
}

/// Handle GET /preferences
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Preferences>, StatusCode> {
    state.preferences().map(Json).map_err(|e| {
        error!("Failed to read preferences: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle PUT /preferences - Partial update of display preferences
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<Preferences>, StatusCode> {
    state.update_preferences(update).map(Json).map_err(|e| {
        error!("Failed to update preferences: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle GET /status - Return the timer as of now
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let preferences = match state.preferences() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to get preferences: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        toast: state.current_toast(),
        preferences,
        uptime: state.get_uptime(),
        save_failures: state.save_failures(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
