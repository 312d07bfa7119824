//! Cryptographic hashing utilities
//!
//! SHA-256 is the one digest function shared by the proof-of-work search
//! and the signing pipeline.

use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in lowercase hex characters
pub const DIGEST_HEX_LEN: usize = 64;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes SHA-256 hash and returns it as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Checks if a hex digest meets the difficulty target
/// The digest must start with `difficulty` `'0'` characters
pub fn meets_difficulty(digest_hex: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    if required > digest_hex.len() {
        return false;
    }

    digest_hex.bytes().take(required).all(|b| b == b'0')
}
