#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use timo::{
    services::{Notifier, SoundPlayer},
    state::{AppState, Collaborators},
    storage::MemoryStore,
    utils::ManualClock,
};

pub const T0: i64 = 1_700_000_000_000;

/// Counts completion side effects
#[derive(Default)]
pub struct CompletionCounter {
    notifications: AtomicUsize,
    sounds: AtomicUsize,
}

impl CompletionCounter {
    pub fn notifications(&self) -> usize {
        self.notifications.load(Ordering::SeqCst)
    }

    pub fn sounds(&self) -> usize {
        self.sounds.load(Ordering::SeqCst)
    }
}

impl Notifier for CompletionCounter {
    fn notify_completion(&self) {
        self.notifications.fetch_add(1, Ordering::SeqCst);
    }
}

impl SoundPlayer for CompletionCounter {
    fn play_completion_sound(&self) {
        self.sounds.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub completions: Arc<CompletionCounter>,
}

pub fn harness_with_store(store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let clock = Arc::new(ManualClock::new(T0));
    let completions = Arc::new(CompletionCounter::default());
    let state = Arc::new(AppState::new(
        store.clone(),
        Collaborators {
            clock: clock.clone(),
            notifier: completions.clone(),
            sound: completions.clone(),
        },
    ));
    Harness {
        state,
        store,
        clock,
        completions,
    }
}

pub fn harness() -> Harness {
    harness_with_store(MemoryStore::new())
}
