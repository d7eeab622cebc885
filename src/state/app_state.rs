//! Main application state management

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{
    engine::{Direction, TimerEngine},
    preferences::{Preferences, PreferencesUpdate},
    timer_state::{format_time, Phase, StepMinutes},
};
use crate::{
    error::{Result, TimerError},
    services::{LogNotifier, Notifier, SilentPlayer, SoundPlayer},
    storage::TimerStore,
    utils::{Clock, SystemClock},
};

/// How long a rejected-adjustment message stays visible
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Read-only view of the timer published after every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub is_active: bool,
    pub duration_minutes: u32,
    pub step_minutes: u32,
    pub phase: Phase,
    pub remaining_ms: u64,
    pub remaining: String,
    pub taken_at_ms: i64,
}

impl TimerSnapshot {
    fn capture(engine: &TimerEngine, now_ms: i64) -> Self {
        let remaining_ms = engine.displayed_remaining_ms(now_ms);
        Self {
            is_active: engine.state().is_active(),
            duration_minutes: engine.config().duration_minutes,
            step_minutes: engine.config().step_minutes.minutes(),
            phase: engine.phase(),
            remaining_ms,
            remaining: format_time(remaining_ms),
            taken_at_ms: now_ms,
        }
    }
}

/// Things the timer talks to but does not own
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub sound: Arc<dyn SoundPlayer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
            sound: Arc::new(SilentPlayer),
        }
    }
}

/// Owns the single timer engine; every mutation goes through here
pub struct AppState {
    engine: Mutex<TimerEngine>,
    preferences: Mutex<Preferences>,
    store: Arc<dyn TimerStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    sound: Arc<dyn SoundPlayer>,
    /// Server metadata
    pub start_time: Instant,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    save_failures: AtomicU64,
    /// Transient user-facing message and when it was posted
    toast: Mutex<Option<(String, Instant)>>,
    toast_tx: broadcast::Sender<String>,
    /// Snapshot after each transition
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
    /// Remaining time published by the tick driver
    display_tx: watch::Sender<u64>,
    _display_rx: watch::Receiver<u64>,
}

impl AppState {
    /// Create the state from whatever the store holds
    pub fn new(store: Arc<dyn TimerStore>, collaborators: Collaborators) -> Self {
        let (config, timer_state) = store.load();
        let preferences = store.load_preferences();
        let engine = TimerEngine::new(config, timer_state);

        let now_ms = collaborators.clock.now_ms();
        let snapshot = TimerSnapshot::capture(&engine, now_ms);
        info!(
            "Restored timer: {} min, step {}, {} with {} left",
            snapshot.duration_minutes, config.step_minutes, snapshot.phase.name(), snapshot.remaining
        );

        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot.clone());
        let (display_tx, display_rx) = watch::channel(snapshot.remaining_ms);
        let (toast_tx, _) = broadcast::channel(16);

        Self {
            engine: Mutex::new(engine),
            preferences: Mutex::new(preferences),
            store,
            clock: collaborators.clock,
            notifier: collaborators.notifier,
            sound: collaborators.sound,
            start_time: Instant::now(),
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            save_failures: AtomicU64::new(0),
            toast: Mutex::new(None),
            toast_tx,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
            display_tx,
            _display_rx: display_rx,
        }
    }

    /// Apply an engine operation, then persist and publish if anything changed.
    ///
    /// The whole sequence runs under the engine lock so transitions are
    /// totally ordered.
    fn transition<F, R>(&self, action: &str, op: F) -> Result<(R, TimerSnapshot)>
    where
        F: FnOnce(&mut TimerEngine, i64) -> R,
    {
        let mut engine = self.engine.lock().map_err(|_| TimerError::Lock("timer engine"))?;
        let now_ms = self.clock.now_ms();

        let before = engine.clone();
        let outcome = op(&mut *engine, now_ms);
        debug_assert!(engine.state().check_invariant());

        let snapshot = TimerSnapshot::capture(&engine, now_ms);
        if *engine == before {
            debug!("{} left the timer unchanged", action);
            return Ok((outcome, snapshot));
        }

        if let Err(e) = self.store.save(engine.config(), engine.state()) {
            self.save_failures.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to persist timer after {}: {}", action, e);
        }

        if let Err(e) = self.snapshot_tx.send(snapshot.clone()) {
            warn!("Failed to send timer snapshot: {}", e);
        }
        if let Err(e) = self.display_tx.send(snapshot.remaining_ms) {
            warn!("Failed to send remaining time: {}", e);
        }
        drop(engine);

        self.record_action(action);
        Ok((outcome, snapshot))
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Begin or resume the countdown
    pub fn start(&self) -> Result<TimerSnapshot> {
        let (started, snapshot) = self.transition("start", |engine, now| engine.start(now))?;
        if started {
            info!("Timer started with {} remaining", snapshot.remaining);
        }
        Ok(snapshot)
    }

    pub fn pause(&self) -> Result<TimerSnapshot> {
        let (paused, snapshot) = self.transition("pause", |engine, now| engine.pause(now))?;
        if paused {
            info!("Timer paused with {} remaining", snapshot.remaining);
        }
        Ok(snapshot)
    }

    pub fn toggle(&self) -> Result<TimerSnapshot> {
        let (phase, snapshot) = self.transition("toggle", |engine, now| engine.toggle(now))?;
        info!("Timer toggled to {} with {} remaining", phase.name(), snapshot.remaining);
        Ok(snapshot)
    }

    pub fn reset(&self) -> Result<TimerSnapshot> {
        let (_, snapshot) = self.transition("reset", |engine, _| engine.reset())?;
        info!("Timer reset to {}", snapshot.remaining);
        Ok(snapshot)
    }

    /// Change the duration by one step; refusals are also posted as a toast
    pub fn adjust_duration(&self, direction: Direction) -> Result<TimerSnapshot> {
        let action = match direction {
            Direction::Increment => "increment",
            Direction::Decrement => "decrement",
        };
        let (outcome, snapshot) =
            self.transition(action, |engine, _| engine.adjust_duration(direction))?;
        self.settle_adjustment(outcome.map(|_| snapshot))
    }

    pub fn set_duration(&self, minutes: u32) -> Result<TimerSnapshot> {
        let (outcome, snapshot) =
            self.transition("set-duration", |engine, _| engine.set_duration(minutes))?;
        self.settle_adjustment(outcome.map(|_| snapshot))
    }

    fn settle_adjustment(
        &self,
        outcome: std::result::Result<TimerSnapshot, super::AdjustError>,
    ) -> Result<TimerSnapshot> {
        match outcome {
            Ok(snapshot) => {
                info!("Duration set to {} minutes", snapshot.duration_minutes);
                Ok(snapshot)
            }
            Err(e) => {
                self.post_toast(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn set_step(&self, step: StepMinutes) -> Result<TimerSnapshot> {
        let (_, snapshot) = self.transition("set-step", |engine, _| engine.set_step(step))?;
        info!("Step set to {}", step);
        Ok(snapshot)
    }

    /// Finish a countdown that has reached zero.
    ///
    /// Notification and sound are emitted only when this call performed the
    /// completion, so overlapping polls cannot repeat them.
    pub fn complete(&self) -> Result<bool> {
        let (completed, _) = self.transition("complete", |engine, now| engine.complete(now))?;
        if completed {
            info!("Timer finished");
            self.notifier.notify_completion();
            self.sound.play_completion_sound();
        }
        Ok(completed)
    }

    /// Recompute the remaining time of a running countdown and publish it.
    /// Returns None when the timer is not running.
    pub fn poll(&self) -> Result<Option<u64>> {
        let engine = self.engine.lock().map_err(|_| TimerError::Lock("timer engine"))?;
        let remaining = engine.tick(self.clock.now_ms());
        drop(engine);

        if let Some(remaining_ms) = remaining {
            self.display_tx.send_replace(remaining_ms);
        }
        Ok(remaining)
    }

    pub fn displayed_remaining_ms(&self) -> Result<u64> {
        let engine = self.engine.lock().map_err(|_| TimerError::Lock("timer engine"))?;
        Ok(engine.displayed_remaining_ms(self.clock.now_ms()))
    }

    /// Current snapshot computed against the clock now
    pub fn snapshot(&self) -> Result<TimerSnapshot> {
        let engine = self.engine.lock().map_err(|_| TimerError::Lock("timer engine"))?;
        Ok(TimerSnapshot::capture(&engine, self.clock.now_ms()))
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Receive the remaining time on every poll
    pub fn subscribe_display(&self) -> watch::Receiver<u64> {
        self.display_tx.subscribe()
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<String> {
        self.toast_tx.subscribe()
    }

    pub fn preferences(&self) -> Result<Preferences> {
        self.preferences
            .lock()
            .map(|preferences| *preferences)
            .map_err(|_| TimerError::Lock("preferences"))
    }

    pub fn update_preferences(&self, update: PreferencesUpdate) -> Result<Preferences> {
        let mut preferences = self
            .preferences
            .lock()
            .map_err(|_| TimerError::Lock("preferences"))?;
        *preferences = update.apply(*preferences);

        if let Err(e) = self.store.save_preferences(&preferences) {
            self.save_failures.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to persist preferences: {}", e);
        }
        let updated = *preferences;
        drop(preferences);

        self.record_action("preferences");
        debug!("Preferences updated: {:?}", updated);
        Ok(updated)
    }

    /// Show a short-lived message to the user
    pub fn post_toast(&self, message: String) {
        info!("Toast: {}", message);
        if let Ok(mut toast) = self.toast.lock() {
            *toast = Some((message.clone(), Instant::now()));
        }
        // No receivers is fine; the message is still readable via current_toast
        let _ = self.toast_tx.send(message);
    }

    /// The last toast, if it has not expired yet
    pub fn current_toast(&self) -> Option<String> {
        let toast = self.toast.lock().ok()?;
        toast
            .as_ref()
            .filter(|(_, posted)| posted.elapsed() < TOAST_DURATION)
            .map(|(message, _)| message.clone())
    }

    /// Number of writes the store rejected this session
    pub fn save_failures(&self) -> u64 {
        self.save_failures.load(Ordering::Relaxed)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::{AdjustError, TimerConfig, TimerState},
        storage::{MemoryStore, TimerStore},
        utils::ManualClock,
    };
    use std::sync::atomic::AtomicUsize;

    const T: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Counter {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl Notifier for Counter {
        fn notify_completion(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl SoundPlayer for Counter {
        fn play_completion_sound(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        state: AppState,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        notifications: Arc<Counter>,
        sounds: Arc<Counter>,
    }

    fn fixture(store: MemoryStore) -> Fixture {
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::new(T));
        let notifications = Arc::new(Counter::default());
        let sounds = Arc::new(Counter::default());
        let state = AppState::new(
            store.clone(),
            Collaborators {
                clock: clock.clone(),
                notifier: notifications.clone(),
                sound: sounds.clone(),
            },
        );
        Fixture {
            state,
            store,
            clock,
            notifications,
            sounds,
        }
    }

    #[test]
    fn every_transition_is_persisted() {
        let f = fixture(MemoryStore::new());
        f.state.start().unwrap();
        assert_eq!(f.store.load().1, TimerState::running(T + 1_500_000));

        f.clock.advance(10_000);
        f.state.pause().unwrap();
        assert_eq!(f.store.load().1, TimerState::paused(1_490_000));

        f.state.reset().unwrap();
        assert_eq!(f.store.load().1, TimerState::idle());
        assert_eq!(f.store.save_count(), 3);
    }

    #[test]
    fn noop_transitions_do_not_write() {
        let f = fixture(MemoryStore::new());
        f.state.pause().unwrap();
        f.state.reset().unwrap();
        assert_eq!(f.store.save_count(), 0);
    }

    #[test]
    fn reload_restores_running_timer_without_drift() {
        let store = MemoryStore::new();
        store
            .save(&TimerConfig::default(), &TimerState::running(T + 1_500_000))
            .unwrap();
        let f = fixture(store);
        f.clock.advance(90_000);
        assert_eq!(f.state.displayed_remaining_ms().unwrap(), 1_410_000);
        assert_eq!(f.state.poll().unwrap(), Some(1_410_000));
    }

    #[test]
    fn storage_failure_keeps_in_memory_state() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let f = fixture(store);

        let snapshot = f.state.start().unwrap();
        assert!(snapshot.is_active);
        assert_eq!(f.state.save_failures(), 1);

        f.clock.advance(5_000);
        assert_eq!(f.state.poll().unwrap(), Some(1_495_000));
        assert_eq!(f.store.load().1, TimerState::idle());
    }

    #[test]
    fn rejected_adjustment_posts_toast() {
        let f = fixture(MemoryStore::new());
        f.state.set_duration(60).unwrap();
        let mut toasts = f.state.subscribe_toasts();

        let err = f.state.adjust_duration(Direction::Increment).unwrap_err();
        assert!(matches!(err, TimerError::Adjust(AdjustError::Maximum)));
        assert_eq!(
            f.state.current_toast().as_deref(),
            Some("Maximum duration is 60 minutes")
        );
        assert_eq!(toasts.try_recv().unwrap(), "Maximum duration is 60 minutes");
        assert_eq!(f.state.snapshot().unwrap().duration_minutes, 60);
    }

    #[test]
    fn completion_notifies_exactly_once() {
        let f = fixture(MemoryStore::new());
        f.state.set_duration(1).unwrap();
        f.state.start().unwrap();

        f.clock.advance(59_999);
        assert!(!f.state.complete().unwrap());

        f.clock.advance(1);
        assert_eq!(f.state.poll().unwrap(), Some(0));
        assert!(f.state.complete().unwrap());
        assert!(!f.state.complete().unwrap());

        assert_eq!(f.notifications.count(), 1);
        assert_eq!(f.sounds.count(), 1);
        let snapshot = f.state.snapshot().unwrap();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.remaining_ms, 60_000);
        assert_eq!(snapshot.remaining, "01:00");
    }

    #[test]
    fn subscribers_see_each_transition() {
        let f = fixture(MemoryStore::new());
        let mut changes = f.state.subscribe();
        changes.borrow_and_update();

        f.state.start().unwrap();
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_active);

        f.state.start().unwrap();
        assert!(!changes.has_changed().unwrap());
    }

    #[test]
    fn preferences_are_persisted_beside_timer() {
        let f = fixture(MemoryStore::new());
        let updated = f
            .state
            .update_preferences(PreferencesUpdate {
                font_index: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.font_index, 2);
        assert_eq!(f.store.load_preferences().font_index, 2);
        assert_eq!(f.state.get_last_action().0.as_deref(), Some("preferences"));
    }
}
