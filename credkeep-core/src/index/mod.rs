//! Backup catalogue: persisted types, the advisory lock and the store.

pub mod lock;
pub mod model;
pub mod store;

pub use model::{BackupEntry, IndexState};
pub use store::IndexStore;
