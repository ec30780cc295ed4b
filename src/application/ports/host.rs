//! Host command execution port

use async_trait::async_trait;
use thiserror::Error;

/// Command execution errors
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("{0} not found. Is it installed?")]
    NotFound(String),

    #[error("Failed to run {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("{program} exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, None when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Port for running commands on the host.
///
/// Implementations decide how privilege is obtained; callers only see stdout and exit status.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` to completion and capture its output, whatever the exit status.
    ///
    /// `input`, when given, is written to the command's stdin and then closed. Payloads that
    /// carry secrets go here instead of onto the command line, where any local user could
    /// read them from the process list.
    ///
    /// # Returns
    /// Err only when the command could not be started
    async fn output_with_input(
        &self,
        argv: &[&str],
        input: Option<&str>,
    ) -> Result<CommandOutput, CommandError>;

    /// Run `argv` with no stdin and capture its output, whatever the exit status.
    async fn output(&self, argv: &[&str]) -> Result<CommandOutput, CommandError> {
        self.output_with_input(argv, None).await
    }

    /// Run `argv` and return stdout, treating a non-zero exit as an error.
    async fn run(&self, argv: &[&str]) -> Result<String, CommandError> {
        let output = self.output(argv).await?;
        stdout_or_failure(argv, output)
    }

    /// Like [`run`](Self::run), feeding `input` to the command's stdin
    async fn run_with_input(&self, argv: &[&str], input: &str) -> Result<String, CommandError> {
        let output = self.output_with_input(argv, Some(input)).await?;
        stdout_or_failure(argv, output)
    }
}

fn stdout_or_failure(argv: &[&str], output: CommandOutput) -> Result<String, CommandError> {
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(CommandError::Failed {
            program: argv.first().copied().unwrap_or_default().to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}
