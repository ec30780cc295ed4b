//! Host command runner using tokio processes

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::{CommandError, CommandOutput, CommandRunner};

/// How commands obtain superuser rights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Run as the current user
    Direct,
    /// Use `sudo -n` when not root; fall back to the current user when sudo is
    /// missing or would prompt
    Try,
}

/// sudo stderr fragments meaning "no usable credentials", not a command failure
const SUDO_DENIED: &[&str] = &[
    "a password is required",
    "a terminal is required",
    "is not in the sudoers file",
    "may not run sudo",
];

/// Process runner adapter
pub struct ProcessRunner {
    privilege: Privilege,
}

impl ProcessRunner {
    pub fn new(privilege: Privilege) -> Self {
        Self { privilege }
    }

    fn needs_sudo(&self) -> bool {
        self.privilege == Privilege::Try && !is_root()
    }

    async fn exec(argv: &[&str], input: Option<&str>) -> Result<CommandOutput, CommandError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CommandError::SpawnFailed {
                program: String::new(),
                message: "empty command line".to_string(),
            })?;
        let spawn_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::NotFound(program.to_string())
            } else {
                CommandError::SpawnFailed {
                    program: program.to_string(),
                    message: e.to_string(),
                }
            }
        };

        debug!(command = %argv.join(" "), stdin = input.is_some(), "exec");
        let mut child = Command::new(program)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            // A child that exits without reading reports through its own status.
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!(error = %e, "stdin closed early");
            }
        }

        let output = child.wait_with_output().await.map_err(spawn_error)?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Privilege::Try)
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn output_with_input(
        &self,
        argv: &[&str],
        input: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.needs_sudo() {
            return Self::exec(argv, input).await;
        }

        let mut elevated = Vec::with_capacity(argv.len() + 2);
        elevated.extend(["sudo", "-n"]);
        elevated.extend_from_slice(argv);

        match Self::exec(&elevated, input).await {
            Ok(output) if !output.success() && sudo_denied(&output.stderr) => {
                debug!("sudo unavailable without a password, running unprivileged");
                Self::exec(argv, input).await
            }
            Err(CommandError::NotFound(_)) => Self::exec(argv, input).await,
            other => other,
        }
    }
}

fn sudo_denied(stderr: &str) -> bool {
    stderr.starts_with("sudo:") && SUDO_DENIED.iter().any(|m| stderr.contains(m))
}

#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
