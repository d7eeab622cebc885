//! Completion notification collaborators

use tracing::info;

use super::command::{spawn_command, CommandLine};

pub const NOTIFICATION_TITLE: &str = "Timo";
pub const NOTIFICATION_BODY: &str = "Timer finished!";

/// Told once per finished countdown. Whether anything is shown is up to the
/// implementation; failures stay inside it.
pub trait Notifier: Send + Sync {
    fn notify_completion(&self);
}

/// Writes the notification to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_completion(&self) {
        info!("{}: {}", NOTIFICATION_TITLE, NOTIFICATION_BODY);
    }
}

/// Launches a desktop notification command, e.g. `notify-send`, with the
/// title and body appended as arguments
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    command: CommandLine,
}

impl CommandNotifier {
    pub fn new(command: CommandLine) -> Self {
        Self { command }
    }
}

impl Notifier for CommandNotifier {
    fn notify_completion(&self) {
        info!("{}: {}", NOTIFICATION_TITLE, NOTIFICATION_BODY);
        let command = self
            .command
            .clone()
            .with_arg(NOTIFICATION_TITLE)
            .with_arg(NOTIFICATION_BODY);
        spawn_command(command, "notification");
    }
}
