//! Completion sound collaborators

use std::io::Write;

use tracing::{debug, warn};

use super::command::{spawn_command, CommandLine};

/// Fire-and-forget completion sound
pub trait SoundPlayer: Send + Sync {
    fn play_completion_sound(&self);
}

#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play_completion_sound(&self) {
        debug!("Completion sound disabled");
    }
}

/// Rings the terminal bell on stdout
#[derive(Debug, Default)]
pub struct BellPlayer;

impl SoundPlayer for BellPlayer {
    fn play_completion_sound(&self) {
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            warn!("Failed to ring terminal bell: {}", e);
        }
    }
}

/// Plays the sound through an external command, e.g. `paplay done.oga`
#[derive(Debug, Clone)]
pub struct CommandSoundPlayer {
    command: CommandLine,
}

impl CommandSoundPlayer {
    pub fn new(command: CommandLine) -> Self {
        Self { command }
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play_completion_sound(&self) {
        spawn_command(self.command.clone(), "sound");
    }
}
