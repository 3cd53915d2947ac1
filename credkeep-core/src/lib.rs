//! credkeep core library
//!
//! Keeps a deduplicated, restorable history of a single credential file.

pub mod config;
pub mod daemon;
pub mod fs;
pub mod index;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, VaultSettings};
pub use index::{BackupEntry, IndexState, IndexStore};
pub use service::scheduler::Scheduler;
pub use service::{BackupService, ScanResult, SkipReason, StatusReport, Trigger};
pub use utils::errors::VaultError;
pub type Result<T> = std::result::Result<T, VaultError>;
