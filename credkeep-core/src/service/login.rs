//! Bounded external login command.

use crate::utils::errors::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Which command to run for a login and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for LoginSettings {
    fn default() -> Self {
        Self {
            command: "codex".to_string(),
            args: vec!["login".to_string()],
            timeout: Duration::from_secs(120),
        }
    }
}

/// Run `program` with `args`, killing it once `timeout` elapses.
///
/// A missing binary, a timeout and a non-zero exit are reported as
/// [`VaultError::CommandNotFound`], [`VaultError::Timeout`] and
/// [`VaultError::CommandFailed`] respectively.
pub async fn run_command(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => {
            warn!(program, timeout_secs = timeout.as_secs(), "Command timed out");
            return Err(VaultError::Timeout(timeout));
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(VaultError::CommandNotFound(program.to_string()));
        }
        Ok(Err(e)) => return Err(VaultError::io(format!("running {program}"))(e)),
        Ok(Ok(output)) => output,
    };

    let captured = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    };

    if output.status.success() {
        info!(program, "Command finished");
        Ok(captured)
    } else {
        warn!(program, exit_code = captured.exit_code, "Command failed");
        Err(VaultError::CommandFailed(captured))
    }
}

/// Run the configured login command.
pub async fn run_login(settings: &LoginSettings) -> Result<CommandOutput> {
    run_command(&settings.command, &settings.args, settings.timeout).await
}
