//! Custom error types for the backup core.

use crate::service::login::CommandOutput;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Label already in use: {0}")]
    LabelConflict(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Command exited with status {}", .0.exit_code)]
    CommandFailed(CommandOutput),
}

impl VaultError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> VaultError {
        let context = context.into();
        move |source| VaultError::Io { context, source }
    }

    /// Stable machine-readable kind, used by callers to tell failures apart.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultError::Config(_) => "config",
            VaultError::Io { .. } => "io",
            VaultError::Serialization(_) => "serialization",
            VaultError::BackupNotFound(_) => "not_found",
            VaultError::LabelConflict(_) => "label_conflict",
            VaultError::InvalidLabel(_) => "invalid_label",
            VaultError::CommandNotFound(_) => "command_not_found",
            VaultError::Timeout(_) => "timeout",
            VaultError::CommandFailed(_) => "command_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_context_is_kept() {
        let err = VaultError::io("reading index")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("reading index"));
    }

    #[test]
    fn test_command_failed_reports_exit_code() {
        let err = VaultError::CommandFailed(CommandOutput {
            stdout: String::new(),
            stderr: "boom".into(),
            exit_code: 3,
        });
        assert_eq!(err.to_string(), "Command exited with status 3");
        assert_eq!(err.kind(), "command_failed");
    }
}
