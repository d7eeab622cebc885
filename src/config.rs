//! Configuration and CLI argument handling

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;

use crate::services::{
    BellPlayer, CommandLine, CommandNotifier, CommandSoundPlayer, LogNotifier, Notifier,
    SilentPlayer, SoundPlayer,
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "timo")]
#[command(about = "A focus timer service that survives restarts and sleep")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the timer state and preferences
    #[arg(short, long, default_value = "timo-state.json")]
    pub state_file: PathBuf,

    /// Milliseconds between countdown polls while running
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Command run on completion with title and body appended, e.g. "notify-send"
    #[arg(long)]
    pub notify_command: Option<String>,

    /// Command run on completion to play a sound, e.g. "paplay done.oga"
    #[arg(long, conflicts_with = "bell")]
    pub sound_command: Option<String>,

    /// Ring the terminal bell on completion
    #[arg(long)]
    pub bell: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notify_command_line(&self) -> Option<CommandLine> {
        self.notify_command.as_deref().and_then(CommandLine::parse)
    }

    pub fn sound_command_line(&self) -> Option<CommandLine> {
        self.sound_command.as_deref().and_then(CommandLine::parse)
    }

    /// Notification collaborator selected by the flags
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        match self.notify_command_line() {
            Some(command) => Arc::new(CommandNotifier::new(command)),
            None => Arc::new(LogNotifier),
        }
    }

    /// Sound collaborator selected by the flags
    pub fn sound_player(&self) -> Arc<dyn SoundPlayer> {
        match self.sound_command_line() {
            Some(command) => Arc::new(CommandSoundPlayer::new(command)),
            None if self.bell => Arc::new(BellPlayer),
            None => Arc::new(SilentPlayer),
        }
    }
}
