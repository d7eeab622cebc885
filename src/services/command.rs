//! External command execution shared by the completion collaborators

use tokio::process::Command;
use tracing::{debug, info, warn};

/// A configured command line, split into program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Parse a whitespace separated command line. Returns None when empty.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Run a command to completion
pub async fn run_command(command: &CommandLine) -> Result<(), String> {
    debug!("Running {} {:?}", command.program, command.args);

    let output = Command::new(&command.program)
        .args(&command.args)
        .output()
        .await
        .map_err(|e| format!("Failed to execute {}: {}", command.program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", command.program, stderr.trim()));
    }

    Ok(())
}

/// Run a command in the background, logging instead of returning failures
pub fn spawn_command(command: CommandLine, purpose: &'static str) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = run_command(&command).await {
                    warn!("{} command failed: {}", purpose, e);
                }
            });
        }
        Err(_) => warn!("No async runtime available, skipping {} command", purpose),
    }
}

/// Check that a program can be launched
pub async fn check_command_available(command: &CommandLine) -> Result<(), String> {
    Command::new(&command.program)
        .arg("--version")
        .output()
        .await
        .map_err(|_| format!("{} is not available on this system", command.program))?;

    info!("{} is available", command.program);
    Ok(())
}
