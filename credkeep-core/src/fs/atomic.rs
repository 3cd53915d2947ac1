//! Write-temp-then-rename helpers.
//!
//! Every file this crate owns is replaced through [`write_atomic`], so a
//! reader always sees either the old or the new content in full.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Permission bits applied to backups and restored targets.
pub const PRIVATE_MODE: u32 = 0o600;

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "directory path is empty"));
    }
    fs::create_dir_all(dir)
}

/// Durably replace `path` with `data`.
///
/// The temp file lives in the same directory so the final rename never
/// crosses filesystems.
pub fn write_atomic(path: &Path, data: &[u8], mode: Option<u32>) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(parent)?;
    tmp.write_all(data)?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Directory fsync is best effort; not every platform supports it.
    fsync_dir(parent).ok();
    Ok(())
}

/// Read `path`, treating a missing file as `None`.
pub fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove `path`, treating a missing file as success.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}
