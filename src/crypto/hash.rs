// Cryptographic hashing wrappers
use sha2::{Digest, Sha256};

/// SHA-256: the chain's only hash primitive — proof-of-work, Merkle roots,
/// and problem-graph identity all reduce to this.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hashes `a` then `b` without allocating a temporary buffer.
pub fn sha256_concat(a: &[u8], b: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}
