//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing and the leading-zero difficulty check
//! - RSA key management
//! - PKCS#1 v1.5 signing and verification

pub mod hash;
pub mod keys;
pub mod signature;

pub use hash::{meets_difficulty, sha256, sha256_hex, DIGEST_HEX_LEN};
pub use keys::{
    generate_key_pair, private_key_from_pem, private_key_to_pem, public_key_from_pem,
    public_key_to_pem, KeyError, KeyPair, DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS,
};
pub use signature::{
    sign, verify, Signature, SignatureParseError, SigningError, VerificationError,
};
