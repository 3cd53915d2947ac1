//! Stat-based fast signature for change detection.
//!
//! The signature only has to short-circuit the common "nothing happened" case
//! without reading file content. It is not collision free: two different
//! contents with identical size, mtime, inode and device produce the same
//! signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Number of digest bytes kept in a signature (16 hex characters).
const SIGNATURE_BYTES: usize = 8;

/// Raw stat metadata captured alongside a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    /// File size in bytes
    pub size: u64,

    /// Last modified time
    pub modified: DateTime<Utc>,

    /// Modification time in nanoseconds relative to the Unix epoch
    pub mtime_nanos: i128,

    /// Inode number (0 where the platform does not expose it)
    pub inode: u64,

    /// Device identifier (0 where the platform does not expose it)
    pub device: u64,
}

/// Fast signature of a file plus the stat data it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub stat: FileStat,
    pub signature: String,
}

impl FileStat {
    /// Read stat metadata for `path`.
    ///
    /// Returns an error of kind [`io::ErrorKind::NotFound`] when the path does
    /// not exist.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;

        #[cfg(unix)]
        let (inode, device) = {
            use std::os::unix::fs::MetadataExt;
            (metadata.ino(), metadata.dev())
        };

        #[cfg(not(unix))]
        let (inode, device) = (0u64, 0u64);

        Ok(Self {
            size: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
            mtime_nanos: nanos_since_epoch(modified),
            inode,
            device,
        })
    }

    /// One-way digest of `(size, mtime, inode, device)`.
    pub fn signature(&self) -> String {
        let seed = format!(
            "{}|{}|{}|{}",
            self.size, self.mtime_nanos, self.inode, self.device
        );
        let sum = Sha256::digest(seed.as_bytes());
        hex::encode(&sum[..SIGNATURE_BYTES])
    }
}

/// Compute the fast signature of `path`.
pub fn fingerprint(path: &Path) -> io::Result<Fingerprint> {
    let stat = FileStat::from_path(path)?;
    let signature = stat.signature();
    Ok(Fingerprint { stat, signature })
}

fn nanos_since_epoch(time: SystemTime) -> i128 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_nanos() as i128,
        Err(before) => -(before.duration().as_nanos() as i128),
    }
}
