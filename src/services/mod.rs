//! External collaborators module
//!
//! Completion notifications and sounds are delegated to these
//! implementations; none of them can affect timer state.

pub mod command;
pub mod notifier;
pub mod sound;

// Re-export main types
pub use command::*;
pub use notifier::*;
pub use sound::*;
