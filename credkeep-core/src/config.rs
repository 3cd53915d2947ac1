//! Configuration management for credkeep.
//!
//! Loaded from a TOML file; every section and field has a default, so a
//! missing file or a partial one is fine.

use crate::service::login::LoginSettings;
use crate::utils::errors::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
    pub server: ServerConfig,
    pub log: LogConfig,
    pub login: LoginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Directory holding the protected file (`~` is expanded)
    pub dir: String,

    /// File name inside `dir`
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Holds `index.json` and the `backups/` directory
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds between automatic scans; 0 disables them
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            dir: "~/.codex".to_string(),
            file: "auth.json".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for LoginConfig {
    fn default() -> Self {
        let defaults = LoginSettings::default();
        Self {
            command: defaults.command,
            args: defaults.args,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

/// Absolute paths and durations the service runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSettings {
    pub target_path: PathBuf,
    pub data_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub index_path: PathBuf,
    pub scan_interval: Duration,
    pub login: LoginSettings,
}

impl VaultSettings {
    /// Lay out `index.json` and `backups/` under `data_dir`.
    pub fn new(target_path: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            target_path: target_path.into(),
            backups_dir: data_dir.join("backups"),
            index_path: data_dir.join("index.json"),
            data_dir,
            scan_interval: Duration::from_secs(ScanConfig::default().interval_secs),
            login: LoginSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(VaultError::io(format!("reading config {}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| VaultError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `path`, falling back to defaults when it does not exist.
    ///
    /// The flag is `true` when defaults were used.
    pub fn load_or_default(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            Ok((Self::from_file(path)?, false))
        } else {
            Ok((Self::default(), true))
        }
    }

    /// Resolve paths and durations.
    pub fn vault_settings(&self) -> Result<VaultSettings> {
        if self.target.file.trim().is_empty() {
            return Err(VaultError::Config("target.file is empty".into()));
        }
        let target_dir = expand_path(&self.target.dir)?;
        let data_dir = expand_path(&self.storage.data_dir)?;

        let mut settings = VaultSettings::new(target_dir.join(&self.target.file), data_dir);
        settings.scan_interval = Duration::from_secs(self.scan.interval_secs);
        settings.login = LoginSettings {
            command: self.login.command.clone(),
            args: self.login.args.clone(),
            timeout: Duration::from_secs(self.login.timeout_secs.max(1)),
        };
        Ok(settings)
    }
}

/// Expand a leading `~` and make the path absolute.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    if raw.is_empty() {
        return Err(VaultError::Config("path is empty".into()));
    }

    let expanded = if raw == "~" || raw.starts_with("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| VaultError::Config("cannot determine home directory".into()))?;
        match raw.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => home,
        }
    } else if raw.starts_with('~') {
        return Err(VaultError::Config(format!("unsupported path expansion: {raw}")));
    } else {
        PathBuf::from(raw)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        let cwd = std::env::current_dir().map_err(VaultError::io("resolving working directory"))?;
        Ok(cwd.join(expanded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credkeep.toml");
        std::fs::write(
            &path,
            "[scan]\ninterval_secs = 5\n\n[storage]\ndata_dir = \"/var/lib/credkeep\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.scan.interval_secs, 5);
        assert_eq!(config.target.file, "auth.json");
        assert_eq!(config.server.port, 8080);

        let settings = config.vault_settings().unwrap();
        assert_eq!(settings.index_path, PathBuf::from("/var/lib/credkeep/index.json"));
        assert_eq!(settings.backups_dir, PathBuf::from("/var/lib/credkeep/backups"));
        assert_eq!(settings.scan_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, defaulted) = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert!(defaulted);
        assert_eq!(config.login.command, "codex");
        assert_eq!(config.login.args, ["login"]);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[scan\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(VaultError::Config(_))));
    }

    #[test]
    fn test_expand_path() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/.codex").unwrap(), home.join(".codex"));
            assert_eq!(expand_path("~").unwrap(), home);
        }
        assert!(expand_path("~other/x").is_err());
        assert!(expand_path("").is_err());
        assert!(expand_path("relative/dir").unwrap().is_absolute());
    }
}
