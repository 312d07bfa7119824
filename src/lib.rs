//! pow-rsa: proof of work signed with RSA
//!
//! This crate provides:
//! - A SHA-256 proof-of-work search over `seed + nonce` candidates
//! - RSA key pair generation with PEM persistence
//! - PKCS#1 v1.5 signing and verification of the winning input
//!
//! # Example
//!
//! ```rust,no_run
//! use pow_rsa::crypto::KeyPair;
//! use pow_rsa::mining::search;
//!
//! // Find an input whose digest starts with four zeros
//! let result = search("egama", 4).unwrap();
//! println!("{} -> {}", result.input, result.digest_hex);
//!
//! // Sign it and check the signature
//! let key_pair = KeyPair::generate(2048).unwrap();
//! let signature = key_pair.sign(result.input.as_bytes()).unwrap();
//! assert!(key_pair.verify(result.input.as_bytes(), &signature).is_ok());
//! ```

pub mod cli;
pub mod crypto;
pub mod mining;
pub mod storage;

// Re-export commonly used types
pub use crypto::{KeyPair, Signature, SigningError, VerificationError};
pub use mining::{search, Miner, MiningError, SearchLimits, SearchResult};
pub use storage::{KeyStore, StorageError};
