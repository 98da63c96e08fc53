//! SHA-256 checksums: a one-shot helper and a streaming digest, used for
//! per-chunk and global integrity checks respectively.

use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `data` in one call.
///
/// # Examples
///
/// ```
/// use dczf_core::checksum::sha256_of;
/// let digest = sha256_of(b"ABRACADABRA");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256_of(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// A streaming SHA-256 digest, fed incrementally and finalized once.
///
/// Used for the global checksum, which is computed over the concatenation
/// of every per-chunk checksum as chunks are produced, without holding them
/// all in memory at once.
pub struct StreamingDigest {
    hasher: Sha256,
}

impl StreamingDigest {
    pub fn new() -> Self {
        StreamingDigest {
            hasher: Sha256::new(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }
}

impl Default for StreamingDigest {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares two digests without early-exiting on the first mismatched byte.
///
/// A plain `a != b` on `[u8; 32]` lowers to a short-circuiting `memcmp`,
/// which leaks the position of the first differing byte through timing.
/// This folds the XOR of every byte pair into a single accumulator and
/// only branches once, at the end.
pub fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let mut diff: u8 = 0;
    for i in 0..32 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}
