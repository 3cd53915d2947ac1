//! Advisory cross-process lock on the index.
//!
//! This is best-effort process-level exclusion: it only holds against
//! processes that take the same lock. It is not a distributed lock.

use fs4::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Exclusive lock held until dropped
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the exclusive lock on `path` is acquired, creating the
    /// lock file if needed.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Try to take the lock without blocking; `None` when someone else holds it.
    #[cfg(test)]
    fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release index lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_until_dropped() -> io::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("index.json.lock");

        let held = FileLock::acquire(&path)?;
        assert!(FileLock::try_acquire(&path)?.is_none());

        drop(held);
        assert!(FileLock::try_acquire(&path)?.is_some());

        Ok(())
    }
}
