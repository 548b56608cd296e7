//! Compose CLI command execution
//!
//! Spawns the compose CLI against one file with a fixed argument
//! template, captures stdout/stderr in full, and bounds the whole
//! invocation with a wall-clock timeout.

use crate::error::{DeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

/// Wall-clock bound for lifecycle commands
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The allowed lifecycle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeCommand {
    Up,
    Down,
    Build,
    Ps,
    Logs,
}

impl ComposeCommand {
    /// Fixed argument template for this command
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            ComposeCommand::Up => &["up", "-d"],
            ComposeCommand::Down => &["down"],
            ComposeCommand::Build => &["build"],
            ComposeCommand::Ps => &["ps"],
            ComposeCommand::Logs => &["logs", "--tail=100"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeCommand::Up => "up",
            ComposeCommand::Down => "down",
            ComposeCommand::Build => "build",
            ComposeCommand::Ps => "ps",
            ComposeCommand::Logs => "logs",
        }
    }
}

impl FromStr for ComposeCommand {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(ComposeCommand::Up),
            "down" => Ok(ComposeCommand::Down),
            "build" => Ok(ComposeCommand::Build),
            "ps" => Ok(ComposeCommand::Ps),
            "logs" => Ok(ComposeCommand::Logs),
            other => Err(DeckError::InvalidCommand(other.to_string())),
        }
    }
}

impl std::fmt::Display for ComposeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one CLI invocation. A non-zero exit code is a successful
/// invocation reporting failure, not an executor error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub command_line: String,
}

/// Compose CLI executor
#[derive(Debug, Clone)]
pub struct Executor {
    /// Use the legacy hyphenated binary instead of the docker plugin
    legacy_binary: bool,
    /// Prefix invocations with sudo
    use_sudo: bool,
    timeout: Duration,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            legacy_binary: false,
            use_sudo: false,
            timeout: COMMAND_TIMEOUT,
        }
    }
}

impl Executor {
    pub fn new(legacy_binary: bool, use_sudo: bool) -> Self {
        Self {
            legacy_binary,
            use_sudo,
            timeout: COMMAND_TIMEOUT,
        }
    }

    /// Override the wall-clock timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Argument vector for `<subcommand> [extra...]` against one file,
    /// including the program itself
    pub fn command_line(&self, file: &Path, args: &[&str]) -> Vec<String> {
        let mut line: Vec<String> = Vec::new();
        if self.use_sudo {
            line.push("sudo".to_string());
        }
        if self.legacy_binary {
            line.push("docker-compose".to_string());
        } else {
            line.push("docker".to_string());
            line.push("compose".to_string());
        }
        line.push("-f".to_string());
        line.push(file.to_string_lossy().to_string());
        line.extend(args.iter().map(|a| a.to_string()));
        line
    }

    /// Run a lifecycle command against a compose file.
    ///
    /// The child runs with its working directory set to the file's
    /// parent so relative build contexts resolve. Exactly one outcome
    /// resolves the call: the process exiting, a spawn failure, or the
    /// timeout killing the child (in which case partial output is
    /// discarded).
    pub async fn run(&self, file: &Path, command: ComposeCommand) -> Result<CommandResult> {
        self.run_args(file, command.args()).await
    }

    pub(crate) async fn run_args(&self, file: &Path, args: &[&str]) -> Result<CommandResult> {
        let line = self.command_line(file, args);

        let cwd = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        run_captured(&line, &cwd, self.timeout).await
    }
}

/// Spawn a command, capture stdout/stderr in full, and bound the whole
/// run with a wall-clock timeout. On timeout the child is killed and the
/// partial output discarded.
pub async fn run_captured(
    line: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandResult> {
    let command_line = line.join(" ");
    info!("Executing: {}", command_line);

    let mut cmd = Command::new(&line[0]);
    cmd.args(&line[1..])
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| DeckError::Spawn(e.to_string()))?;

    // wait_with_output drains both pipes while waiting, so the child
    // cannot stall on a full pipe buffer.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output.map_err(|e| DeckError::Spawn(e.to_string()))?,
        // kill_on_drop reaps the child
        Err(_) => return Err(DeckError::Timeout(timeout.as_secs())),
    };

    Ok(CommandResult {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        command_line,
    })
}
