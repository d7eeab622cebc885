//! Countdown polling background task

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::state::{AppState, Phase, TimerSnapshot};

/// Reference polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why a countdown loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    /// The timer reached zero and was completed
    Completed,
    /// A transition happened or the timer is no longer running
    Interrupted,
    /// The state was dropped or can no longer be read
    Closed,
}

/// Background task that polls the timer while it runs and completes it at zero.
///
/// Nothing is polled while the timer is idle or paused. Every start gets a
/// fresh loop evaluated against the new target end time.
pub async fn tick_driver_task(state: Arc<AppState>, poll_interval: Duration) {
    info!("Starting tick driver with {:?} poll interval", poll_interval);

    let mut changes = state.subscribe();

    loop {
        let phase = changes.borrow_and_update().phase;

        if let Phase::Running { target_end_ms } = phase {
            debug!("Polling countdown towards {}", target_end_ms);
            match run_countdown(&state, &mut changes, poll_interval).await {
                LoopExit::Completed => {
                    debug!("Countdown completed");
                    continue;
                }
                LoopExit::Interrupted => continue,
                LoopExit::Closed => break,
            }
        }

        if changes.changed().await.is_err() {
            break;
        }
    }

    info!("Tick driver stopped");
}

async fn run_countdown(
    state: &AppState,
    changes: &mut watch::Receiver<TimerSnapshot>,
    poll_interval: Duration,
) -> LoopExit {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // The poll re-checks the phase under the lock, so a tick that
                // races with pause or reset sees a non-running timer.
                match state.poll() {
                    Ok(Some(0)) => {
                        match state.complete() {
                            Ok(true) => info!("Countdown reached zero"),
                            Ok(false) => debug!("Countdown already completed elsewhere"),
                            Err(e) => error!("Failed to complete timer: {}", e),
                        }
                        return LoopExit::Completed;
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => return LoopExit::Interrupted,
                    Err(e) => {
                        error!("Failed to poll timer: {}", e);
                        return LoopExit::Closed;
                    }
                }
            }

            changed = changes.changed() => {
                if changed.is_err() {
                    return LoopExit::Closed;
                }
                debug!("Timer changed while polling, re-evaluating");
                return LoopExit::Interrupted;
            }
        }
    }
}
