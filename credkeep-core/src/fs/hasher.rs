//! Full-content digests.
//!
//! The same read pass feeds the hasher and the returned buffer, so a backup is
//! always written from exactly the bytes that were hashed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Name recorded in the index for the digest below.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// Length of the digest prefix used in filenames and log lines.
pub const SHORT_DIGEST_LEN: usize = 12;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest of a file together with the bytes that produced it
#[derive(Debug, Clone)]
pub struct HashedContent {
    /// Hex-encoded SHA-256
    pub digest: String,
    pub bytes: Vec<u8>,
}

/// Stream `path` once, returning its hex digest and content.
pub fn hash_file(path: &Path) -> io::Result<HashedContent> {
    let mut file = File::open(path)?;
    let capacity = file.metadata().map(|m| m.len() as usize).unwrap_or(0);

    let mut hasher = Sha256::new();
    let mut bytes = Vec::with_capacity(capacity);
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
        bytes.extend_from_slice(&buffer[..read]);
    }

    Ok(HashedContent {
        digest: hex::encode(hasher.finalize()),
        bytes,
    })
}

/// Hex digest of an in-memory buffer.
#[cfg(test)]
pub(crate) fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Truncated digest for display and naming.
pub fn short_digest(digest: &str) -> &str {
    digest.get(..SHORT_DIGEST_LEN).unwrap_or(digest)
}
