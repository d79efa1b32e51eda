//! Partition and payload digests.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Read granularity; cancellation is checked between chunks.
const CHUNK_SIZE: usize = 128 * 1024;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("hashing canceled")]
    Canceled,

    #[error("partition ended after {actual} of {expected} bytes")]
    Truncated { expected: u64, actual: u64 },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// SHA-256 of the first `len` bytes of `reader`.
///
/// # Errors
///
/// Returns `Truncated` if the reader ends early, `Canceled` once `canceled`
/// is observed set, and `Io` on read errors.
pub fn sha256_prefix(
    mut reader: impl Read,
    len: u64,
    canceled: &AtomicBool,
) -> Result<Vec<u8>, HashError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut remaining = len;

    while remaining > 0 {
        if canceled.load(Ordering::Relaxed) {
            return Err(HashError::Canceled);
        }
        let want = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(HashError::Truncated {
                    expected: len,
                    actual: len - remaining,
                });
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
        remaining -= n as u64;
    }

    Ok(hasher.finalize().to_vec())
}

/// Compares a textual digest against raw digest bytes.
///
/// The text may be lowercase or uppercase hex.
#[must_use]
pub fn digest_matches(expected: &str, actual: &[u8]) -> bool {
    hex::decode(expected.trim()).is_ok_and(|bytes| bytes == actual)
}
