//! Message signing and verification
//!
//! Messages are hashed with SHA-256 and the digest is signed with RSA
//! PKCS#1 v1.5 padding.

use log::debug;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

use super::hash::sha256;

/// Errors raised while producing a signature
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("RSA signing failed: {0}")]
    Rsa(#[from] rsa::Error),
}

/// The signature does not match the message and public key
///
/// This is a normal negative result rather than a fault: wrong keys,
/// tampered messages and corrupted signature bytes all end up here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Signature verification failed")]
pub struct VerificationError;

/// Errors raised while parsing a signature
#[derive(Error, Debug)]
pub enum SignatureParseError {
    #[error("Invalid signature hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Signature is empty")]
    Empty,
}

/// Raw signature bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded signature
    pub fn from_hex(hex_sig: &str) -> Result<Self, SignatureParseError> {
        let bytes = hex::decode(hex_sig.trim())?;
        if bytes.is_empty() {
            return Err(SignatureParseError::Empty);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Sign a message with a private key
pub fn sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Signature, SigningError> {
    let hashed = sha256(message);
    let bytes = private_key.sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)?;
    Ok(Signature(bytes))
}

/// Verify a signature against a public key
pub fn verify(
    public_key: &RsaPublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), VerificationError> {
    let hashed = sha256(message);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature.as_bytes())
        .map_err(|e| {
            debug!("Signature rejected: {}", e);
            VerificationError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use std::sync::OnceLock;

    fn test_key_pair() -> &'static KeyPair {
        static KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();
        KEY_PAIR.get_or_init(|| KeyPair::generate(1024).unwrap())
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = test_key_pair();
        let message = b"egama0";

        let signature = sign(kp.private_key(), message).unwrap();
        assert_eq!(signature.len(), 128);
        assert!(verify(kp.public_key(), message, &signature).is_ok());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = test_key_pair();
        let first = kp.sign(b"egama0").unwrap();
        let second = kp.sign(b"egama0").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tampered_message_fails() {
        let kp = test_key_pair();
        let signature = kp.sign(b"egama0").unwrap();

        assert_eq!(kp.verify(b"egama1", &signature), Err(VerificationError));
        assert_eq!(kp.verify(b"", &signature), Err(VerificationError));
    }

    #[test]
    fn test_signature_for_other_message_fails() {
        let kp = test_key_pair();
        let signature = kp.sign(b"egama0 ").unwrap();
        assert!(kp.verify(b"egama0", &signature).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp = test_key_pair();
        let other = KeyPair::generate(1024).unwrap();
        let signature = kp.sign(b"egama0").unwrap();

        assert!(other.verify(b"egama0", &signature).is_err());
    }

    #[test]
    fn test_single_bit_flip_fails() {
        let kp = test_key_pair();
        let message = b"egama0";
        let signature = kp.sign(message).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut bytes = signature.as_bytes().to_vec();
                bytes[byte] ^= 1 << bit;
                let corrupted = Signature::from_bytes(bytes);
                assert!(
                    kp.verify(message, &corrupted).is_err(),
                    "flip of bit {} in byte {} verified",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_malformed_signature_fails() {
        let kp = test_key_pair();
        let signature = kp.sign(b"egama0").unwrap();

        let truncated = Signature::from_bytes(signature.as_bytes()[..64].to_vec());
        assert!(kp.verify(b"egama0", &truncated).is_err());

        let mut extended = signature.as_bytes().to_vec();
        extended.push(0);
        assert!(kp.verify(b"egama0", &Signature::from_bytes(extended)).is_err());

        assert!(kp.verify(b"egama0", &Signature::from_bytes(Vec::new())).is_err());
        assert!(kp
            .verify(b"egama0", &Signature::from_bytes(vec![0xff; 128]))
            .is_err());
    }

    #[test]
    fn test_signature_hex() {
        let kp = test_key_pair();
        let signature = kp.sign(b"egama0").unwrap();

        let parsed = Signature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(parsed, signature);
        assert_eq!(signature.to_string(), signature.to_hex());

        assert!(matches!(
            Signature::from_hex("zz"),
            Err(SignatureParseError::InvalidHex(_))
        ));
        assert!(matches!(
            Signature::from_hex(""),
            Err(SignatureParseError::Empty)
        ));
    }
}
