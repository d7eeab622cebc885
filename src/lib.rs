//! Timo - A focus timer service with persisted, drift-free state
//!
//! This library provides a countdown engine that derives remaining time from
//! an absolute target end timestamp, a key-value persistence layer, and a
//! polling task that completes the countdown when it reaches zero.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, Collaborators, TimerEngine};
pub use storage::{FileStore, MemoryStore, TimerStore};
pub use utils::signals::shutdown_signal;
