//! Utility modules for the backup core.

pub mod errors;
pub mod logger;

pub use errors::{Result, VaultError};
