//! Backup filename allocation.
//!
//! Names look like `20240101-120000_0123456789ab.json`; a `-N` suffix is added
//! when the name is already taken. Allocation is check-then-use, so callers
//! must serialize allocate + write themselves.

use super::hasher::short_digest;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::Path;

/// Extension used when the target file has none.
pub const DEFAULT_EXTENSION: &str = "bak";

/// Timestamp layout shared by filenames and synthesized labels.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Extension for backups of `target`, taken from the target itself.
pub fn extension_for(target: &Path) -> String {
    target
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}

/// `{timestamp}_{shortDigest}.{ext}`
pub fn base_filename<Tz>(timestamp: &DateTime<Tz>, digest: &str, ext: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}_{}.{}",
        timestamp.format(TIMESTAMP_FORMAT),
        short_digest(digest),
        ext
    )
}

/// Pick a filename in `dir` that no existing file uses.
pub fn allocate<Tz>(
    dir: &Path,
    timestamp: &DateTime<Tz>,
    digest: &str,
    ext: &str,
) -> io::Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let base = base_filename(timestamp, digest, ext);
    if !is_taken(dir, &base)? {
        return Ok(base);
    }

    let stem = format!("{}_{}", timestamp.format(TIMESTAMP_FORMAT), short_digest(digest));
    let mut counter = 1u32;
    loop {
        let candidate = format!("{}-{}.{}", stem, counter, ext);
        if !is_taken(dir, &candidate)? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

fn is_taken(dir: &Path, name: &str) -> io::Result<bool> {
    match fs::symlink_metadata(dir.join(name)) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
