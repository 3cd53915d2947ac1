//! Durable, transactional index store.
//!
//! Every mutation runs as read-modify-write under two locks: an in-process
//! mutex and the advisory file lock next to the index. The new state is
//! written to a temp file and renamed over the index, so the file on disk is
//! always a complete old or new version.

use super::lock::FileLock;
use super::model::{BackupEntry, IndexState};
use crate::fs::atomic;
use crate::utils::errors::{Result, VaultError};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub struct IndexStore {
    index_path: PathBuf,
    lock_path: PathBuf,
    target_path: PathBuf,
    guard: Mutex<()>,
}

impl IndexStore {
    pub fn new(index_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        let index_path = index_path.into();
        let mut lock_name = index_path.clone().into_os_string();
        lock_name.push(".lock");
        Self {
            lock_path: PathBuf::from(lock_name),
            index_path,
            target_path: target_path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Independent copy of the current state.
    pub fn snapshot(&self) -> Result<IndexState> {
        let _guard = self.lock_in_process();
        self.load()
    }

    /// Apply `mutator` transactionally and return the committed state.
    ///
    /// An error from the mutator aborts the transaction without touching disk.
    pub fn update<F>(&self, mutator: F) -> Result<IndexState>
    where
        F: FnOnce(&mut IndexState) -> Result<()>,
    {
        self.transact(mutator).map(|(state, ())| state)
    }

    /// Like [`update`](Self::update) but lets the mutator hand a value back.
    pub fn transact<F, T>(&self, mutator: F) -> Result<(IndexState, T)>
    where
        F: FnOnce(&mut IndexState) -> Result<T>,
    {
        let _guard = self.lock_in_process();
        let _file_lock = FileLock::acquire(&self.lock_path).map_err(VaultError::io(format!(
            "locking {}",
            self.lock_path.display()
        )))?;

        let mut state = self.load()?;
        let value = mutator(&mut state)?;
        state.normalize(&self.target_path);
        self.persist(&state)?;
        Ok((state, value))
    }

    /// Append `entry` and record `latest_signature`.
    ///
    /// Fails with [`VaultError::LabelConflict`] when the label belongs to a
    /// different entry.
    pub fn add_entry(&self, entry: BackupEntry, latest_signature: &str) -> Result<IndexState> {
        self.update(|state| {
            if let Some(label) = entry.label.as_deref() {
                if let Some(owner) = state.label_owner(label) {
                    if owner != entry.id {
                        return Err(VaultError::LabelConflict(label.to_string()));
                    }
                }
                state.label_index.insert(label.to_string(), entry.id.clone());
            }
            state.entries.push(entry);
            state.latest_signature = Some(latest_signature.to_string());
            Ok(())
        })
    }

    pub fn set_latest_signature(&self, signature: Option<String>) -> Result<IndexState> {
        self.update(|state| {
            state.latest_signature = signature;
            Ok(())
        })
    }

    /// Change or clear the label of entry `id`, keeping labels unique.
    pub fn rename_label(&self, id: &str, new_label: Option<String>) -> Result<BackupEntry> {
        let new_label = new_label.filter(|l| !l.is_empty());
        let (_, updated) = self.transact(|state| {
            let current = state
                .entry(id)
                .ok_or_else(|| VaultError::BackupNotFound(id.to_string()))?;
            if current.label == new_label {
                return Ok(current.clone());
            }
            if let Some(label) = new_label.as_deref() {
                if state.label_owner(label).is_some_and(|owner| owner != id) {
                    return Err(VaultError::LabelConflict(label.to_string()));
                }
            }

            let old_label = current.label.clone();
            if let Some(old) = old_label {
                state.label_index.remove(&old);
            }
            if let Some(label) = new_label.clone() {
                state.label_index.insert(label, id.to_string());
            }
            let entry = state
                .entry_mut(id)
                .ok_or_else(|| VaultError::BackupNotFound(id.to_string()))?;
            entry.label = new_label;
            Ok(entry.clone())
        })?;
        Ok(updated)
    }

    /// Remove entry `id` and its label.
    ///
    /// The latest signature falls back to the now-newest remaining entry, or
    /// is cleared when none remain.
    pub fn delete_entry(&self, id: &str) -> Result<BackupEntry> {
        let (_, removed) = self.transact(|state| {
            let position = state
                .entries
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| VaultError::BackupNotFound(id.to_string()))?;
            let removed = state.entries.remove(position);
            if let Some(label) = removed.label.as_deref() {
                state.label_index.remove(label);
            }
            state.latest_signature = state.newest_entry().map(|e| e.fast_signature.clone());
            Ok(removed)
        })?;
        Ok(removed)
    }

    /// All entries, newest first.
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        Ok(self.snapshot()?.sorted_entries())
    }

    pub fn find_by_id(&self, id: &str) -> Result<BackupEntry> {
        self.snapshot()?
            .entry(id)
            .cloned()
            .ok_or_else(|| VaultError::BackupNotFound(id.to_string()))
    }

    pub fn find_by_digest(&self, digest: &str) -> Result<Option<BackupEntry>> {
        Ok(self.snapshot()?.find_by_digest(digest).cloned())
    }

    fn lock_in_process(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<IndexState> {
        let raw = atomic::read_if_exists(&self.index_path).map_err(VaultError::io(format!(
            "reading {}",
            self.index_path.display()
        )))?;
        let mut state = match raw {
            Some(bytes) => serde_json::from_slice::<IndexState>(&bytes)?,
            None => {
                debug!(path = %self.index_path.display(), "Index not found, starting empty");
                IndexState::default()
            }
        };
        if state.normalize(&self.target_path) {
            warn!(path = %self.index_path.display(), "Label index disagreed with entries, rebuilt");
        }
        Ok(state)
    }

    fn persist(&self, state: &IndexState) -> Result<()> {
        let payload = serde_json::to_vec_pretty(state)?;
        atomic::write_atomic(&self.index_path, &payload, None).map_err(VaultError::io(format!(
            "writing {}",
            self.index_path.display()
        )))
    }
}
