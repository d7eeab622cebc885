mod common;

use std::{sync::Arc, time::Duration};

use serde_json::json;
use timo::{
    state::{Phase, TimerConfig, TimerState},
    storage::{MemoryStore, TimerStore},
    tasks::{tick_driver_task, DEFAULT_POLL_INTERVAL},
};

use common::{harness, harness_with_store, Harness, T0};

fn spawn_driver(h: &Harness) -> tokio::task::JoinHandle<()> {
    let state = Arc::clone(&h.state);
    tokio::spawn(tick_driver_task(state, DEFAULT_POLL_INTERVAL))
}

/// Move the wall clock and the runtime clock forward together
async fn advance(h: &Harness, total_ms: i64, step_ms: i64) {
    let mut elapsed = 0;
    while elapsed < total_ms {
        h.clock.advance(step_ms);
        tokio::time::sleep(Duration::from_millis(step_ms as u64)).await;
        elapsed += step_ms;
    }
}

#[tokio::test(start_paused = true)]
async fn countdown_completes_exactly_once() {
    let h = harness();
    h.state.set_duration(1).unwrap();
    let driver = spawn_driver(&h);

    h.state.start().unwrap();
    advance(&h, 59_000, 1_000).await;
    assert!(h.state.snapshot().unwrap().is_active);
    assert_eq!(h.completions.notifications(), 0);

    advance(&h, 5_000, 250).await;
    let snapshot = h.state.snapshot().unwrap();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.remaining_ms, 60_000);
    assert_eq!(h.completions.notifications(), 1);
    assert_eq!(h.completions.sounds(), 1);

    advance(&h, 10_000, 1_000).await;
    assert_eq!(h.completions.notifications(), 1);

    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn display_updates_follow_the_wall_clock() {
    let h = harness();
    let driver = spawn_driver(&h);
    let display = h.state.subscribe_display();

    h.state.start().unwrap();
    advance(&h, 90_000, 500).await;
    assert_eq!(*display.borrow(), 1_410_000);

    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn paused_timer_is_not_polled() {
    let h = harness();
    h.state.set_duration(1).unwrap();
    let driver = spawn_driver(&h);

    h.state.start().unwrap();
    advance(&h, 20_000, 1_000).await;
    h.state.pause().unwrap();

    let display = h.state.subscribe_display();
    let frozen = *display.borrow();
    assert_eq!(frozen, 40_000);

    advance(&h, 120_000, 1_000).await;
    assert_eq!(*display.borrow(), frozen);
    assert_eq!(h.state.snapshot().unwrap().phase, Phase::Paused { remaining_ms: 40_000 });
    assert_eq!(h.completions.notifications(), 0);

    // Resuming starts a fresh loop against the new target
    h.state.start().unwrap();
    advance(&h, 41_000, 1_000).await;
    assert_eq!(h.state.snapshot().unwrap().phase, Phase::Idle);
    assert_eq!(h.completions.notifications(), 1);

    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn reset_stops_polling_without_completion() {
    let h = harness();
    h.state.set_duration(1).unwrap();
    let driver = spawn_driver(&h);

    h.state.start().unwrap();
    advance(&h, 30_000, 1_000).await;
    h.state.reset().unwrap();
    advance(&h, 60_000, 1_000).await;

    assert_eq!(h.completions.notifications(), 0);
    assert_eq!(h.state.snapshot().unwrap().remaining_ms, 60_000);

    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn expired_timer_from_storage_completes_on_startup() {
    let store = MemoryStore::new();
    store
        .save(&TimerConfig::default(), &TimerState::running(T0 - 5_000))
        .unwrap();
    let h = harness_with_store(store);
    let driver = spawn_driver(&h);

    advance(&h, 200, 50).await;

    assert_eq!(h.completions.notifications(), 1);
    assert_eq!(h.state.snapshot().unwrap().phase, Phase::Idle);
    let entries = h.store.entries();
    assert_eq!(entries["pomodoro-is-active"], json!(false));
    assert_eq!(entries["pomodoro-target-end-time"], serde_json::Value::Null);

    driver.abort();
}

#[tokio::test(start_paused = true)]
async fn restored_running_timer_keeps_counting() {
    let store = MemoryStore::new();
    store
        .save(&TimerConfig::default(), &TimerState::running(T0 + 60_000))
        .unwrap();
    let h = harness_with_store(store);
    let driver = spawn_driver(&h);

    advance(&h, 30_000, 1_000).await;
    assert_eq!(h.state.displayed_remaining_ms().unwrap(), 30_000);
    assert_eq!(h.completions.notifications(), 0);

    advance(&h, 31_000, 1_000).await;
    assert_eq!(h.completions.notifications(), 1);

    driver.abort();
}
