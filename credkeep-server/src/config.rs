use credkeep_core::{Config, VaultSettings};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub log_level: String,
    pub vault: VaultSettings,
    /// True when no config file was found and defaults were used
    pub defaulted: bool,
}

impl AppConfig {
    /// Config file first, then environment (`.env` included), then CLI flags.
    pub fn load(path: &Path, port: Option<u16>, log_level: Option<String>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let (mut file, defaulted) = Config::load_or_default(path)?;

        if let Some(dir) = std::env::var("DATA_DIR").ok().filter(|v| !v.is_empty()) {
            file.storage.data_dir = dir;
        }
        if let Some(secs) = std::env::var("SCAN_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()) {
            file.scan.interval_secs = secs;
        }

        let vault = file.vault_settings()?;

        Ok(Self {
            port: port
                .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
                .unwrap_or(file.server.port),
            log_level: log_level
                .or_else(|| std::env::var("LOG_LEVEL").ok())
                .unwrap_or(file.log.level),
            vault,
            defaulted,
        })
    }
}
