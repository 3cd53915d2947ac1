//! File system primitives: fast signatures, content digests, backup naming
//! and atomic writes.

pub mod atomic;
pub mod fingerprint;
pub mod hasher;
pub mod naming;

pub use fingerprint::{fingerprint, FileStat, Fingerprint};
pub use hasher::{hash_file, short_digest, HashedContent, DIGEST_ALGORITHM};
