// SPDX-License-Identifier: GPL-3.0-only

//! External command execution
//!
//! Discovery shells out to host tools (`ls`, `v4l2-ctl`) the same way camera
//! enumeration shells out to `pw-cli`. The [`CommandRunner`] trait is the seam
//! that lets tests substitute canned output for real processes.

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tracing::debug;

/// How a command's standard error stream is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// stderr becomes the error message when the command fails
    #[default]
    Message,
    /// stderr is appended to the returned output
    Output,
    /// stderr is discarded
    Ignore,
}

/// Per-invocation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub error_mode: ErrorMode,
    /// Run with elevated privileges (via the configured elevation command)
    pub elevate: bool,
}

impl RunOptions {
    /// Elevated execution with stderr folded into the error message
    pub fn elevated() -> Self {
        Self {
            error_mode: ErrorMode::Message,
            elevate: true,
        }
    }
}

/// A command failed to start or exited unsuccessfully
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandError {
    pub message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Command execution facility
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` and return its standard output as text
    async fn run(&self, argv: &[String], options: RunOptions) -> Result<String, CommandError>;
}

/// Runs commands as host processes through `tokio::process`
#[derive(Debug, Clone)]
pub struct HostCommandRunner {
    elevation: Vec<String>,
}

impl HostCommandRunner {
    /// `elevation` is prepended to argv for elevated runs (e.g. `["pkexec"]`)
    pub fn new(elevation: Vec<String>) -> Self {
        Self { elevation }
    }

    fn build_argv(&self, argv: &[String], elevate: bool) -> Vec<String> {
        if elevate {
            self.elevation.iter().chain(argv).cloned().collect()
        } else {
            argv.to_vec()
        }
    }
}

#[async_trait]
impl CommandRunner for HostCommandRunner {
    async fn run(&self, argv: &[String], options: RunOptions) -> Result<String, CommandError> {
        let full = self.build_argv(argv, options.elevate);
        let Some((program, args)) = full.split_first() else {
            return Err(CommandError::new("empty command line"));
        };

        debug!(program = %program, args = ?args, elevate = options.elevate, "Running command");

        let stderr = match options.error_mode {
            ErrorMode::Ignore => Stdio::null(),
            _ => Stdio::piped(),
        };

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .output()
            .await
            .map_err(|e| CommandError::new(format!("{}: {}", program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let message = match (options.error_mode, stderr.trim()) {
                (ErrorMode::Message, err) if !err.is_empty() => err.to_string(),
                _ => format!("{} exited with {}", program, output.status),
            };
            debug!(program = %program, status = %output.status, "Command failed");
            return Err(CommandError::new(message));
        }

        Ok(match options.error_mode {
            ErrorMode::Output => stdout + &stderr,
            _ => stdout,
        })
    }
}

/// Convenience for building argv vectors from string literals
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
