//! RSA key management
//!
//! Provides key pair generation and PEM encoding for the signing pipeline.
//! Generation is purely in-memory; writing keys to disk is the job of
//! [`crate::storage`].

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use super::signature::{self, Signature, SigningError, VerificationError};

/// Default RSA modulus size in bits
pub const DEFAULT_MODULUS_BITS: usize = 2048;

/// Smallest modulus accepted for new key pairs
pub const MIN_MODULUS_BITS: usize = 1024;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Key generation failed: {0}")]
    Generation(String),
    #[error("Modulus of {bits} bits is too small (min: {min})")]
    InvalidModulus { bits: usize, min: usize },
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Key encoding failed: {0}")]
    Encoding(String),
}

/// An RSA private key together with its public half
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generate a new key pair from the operating system RNG
    pub fn generate(modulus_bits: usize) -> Result<Self, KeyError> {
        Self::generate_with_rng(&mut OsRng, modulus_bits)
    }

    /// Generate a new key pair from a caller-supplied RNG
    pub fn generate_with_rng<R>(rng: &mut R, modulus_bits: usize) -> Result<Self, KeyError>
    where
        R: CryptoRng + RngCore,
    {
        if modulus_bits < MIN_MODULUS_BITS {
            return Err(KeyError::InvalidModulus {
                bits: modulus_bits,
                min: MIN_MODULUS_BITS,
            });
        }

        let private_key = RsaPrivateKey::new(rng, modulus_bits)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Create a key pair from an existing private key
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Create a key pair from a PKCS#1 PEM private key
    pub fn from_private_key_pem(pem: &str) -> Result<Self, KeyError> {
        private_key_from_pem(pem).map(Self::from_private_key)
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Modulus size in bits
    pub fn modulus_bits(&self) -> usize {
        self.public_key.size() * 8
    }

    /// Encode the private key as PKCS#1 PEM
    /// WARNING: Keep this secret!
    pub fn private_key_pem(&self) -> Result<Zeroizing<String>, KeyError> {
        private_key_to_pem(&self.private_key)
    }

    /// Encode the public key as SubjectPublicKeyInfo PEM
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        public_key_to_pem(&self.public_key)
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        signature::sign(&self.private_key, message)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), VerificationError> {
        signature::verify(&self.public_key, message, signature)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &self.modulus_bits())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Generate a new key pair with the given modulus size
pub fn generate_key_pair(modulus_bits: usize) -> Result<KeyPair, KeyError> {
    KeyPair::generate(modulus_bits)
}

/// Encode a private key as PKCS#1 PEM (`RSA PRIVATE KEY`)
pub fn private_key_to_pem(private_key: &RsaPrivateKey) -> Result<Zeroizing<String>, KeyError> {
    private_key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}

/// Encode a public key as SubjectPublicKeyInfo PEM (`PUBLIC KEY`)
pub fn public_key_to_pem(public_key: &RsaPublicKey) -> Result<String, KeyError> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(e.to_string()))
}

/// Parse a PKCS#1 PEM private key
pub fn private_key_from_pem(pem: &str) -> Result<RsaPrivateKey, KeyError> {
    RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}

/// Parse a SubjectPublicKeyInfo PEM public key
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, KeyError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
}
