//! Key and proof persistence layer
//!
//! Keys are written as PEM files, proofs as JSON. Every write goes to a
//! temporary sibling file first and is then renamed into place.

use crate::crypto::{private_key_from_pem, public_key_from_pem, KeyError, KeyPair};
use crate::mining::SearchResult;
use log::{info, warn};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Key error: {0}")]
    KeyError(#[from] KeyError),
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Public key in {0} does not belong to the private key")]
    KeyMismatch(PathBuf),
}

/// Key store configuration
#[derive(Debug, Clone)]
pub struct KeyStoreConfig {
    pub dir: PathBuf,
    pub private_key_file: String,
    pub public_key_file: String,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            private_key_file: "private_key.pem".to_string(),
            public_key_file: "public_key.pem".to_string(),
        }
    }
}

/// Key pair storage manager
#[derive(Debug, Clone)]
pub struct KeyStore {
    config: KeyStoreConfig,
}

impl KeyStore {
    /// Create a new key store
    pub fn new(config: KeyStoreConfig) -> Self {
        Self { config }
    }

    /// Create a key store rooted at `dir` with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(KeyStoreConfig {
            dir: dir.into(),
            ..Default::default()
        })
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.config.dir.join(&self.config.private_key_file)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.config.dir.join(&self.config.public_key_file)
    }

    /// Check if both key files exist
    pub fn exists(&self) -> bool {
        self.private_key_path().exists() && self.public_key_path().exists()
    }

    /// Save the key pair to disk
    pub fn save(&self, key_pair: &KeyPair) -> Result<(), StorageError> {
        persist(key_pair, &self.private_key_path(), &self.public_key_path())
    }

    /// Load the key pair from disk
    pub fn load(&self) -> Result<KeyPair, StorageError> {
        load_key_pair(&self.private_key_path(), &self.public_key_path())
    }

    /// Load only the public key
    pub fn load_public_key(&self) -> Result<RsaPublicKey, StorageError> {
        load_public_key(&self.public_key_path())
    }
}

/// Write both halves of a key pair to disk
pub fn persist(
    key_pair: &KeyPair,
    private_key_path: &Path,
    public_key_path: &Path,
) -> Result<(), StorageError> {
    let private_pem = key_pair.private_key_pem()?;
    let public_pem = key_pair.public_key_pem()?;

    write_atomic(private_key_path, private_pem.as_bytes(), true)?;
    write_atomic(public_key_path, public_pem.as_bytes(), false)?;

    info!(
        "Saved {}-bit key pair to {:?} and {:?}",
        key_pair.modulus_bits(),
        private_key_path,
        public_key_path
    );
    Ok(())
}

/// Load a PKCS#1 PEM private key
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey, StorageError> {
    let pem = read_existing(path)?;
    Ok(private_key_from_pem(&pem)?)
}

/// Load a SubjectPublicKeyInfo PEM public key
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey, StorageError> {
    let pem = read_existing(path)?;
    Ok(public_key_from_pem(&pem)?)
}

/// Load both key files and check that they belong together
pub fn load_key_pair(
    private_key_path: &Path,
    public_key_path: &Path,
) -> Result<KeyPair, StorageError> {
    let key_pair = KeyPair::from_private_key(load_private_key(private_key_path)?);
    let public_key = load_public_key(public_key_path)?;

    if &public_key != key_pair.public_key() {
        return Err(StorageError::KeyMismatch(public_key_path.to_path_buf()));
    }

    Ok(key_pair)
}

/// Save a search result as JSON
pub fn save_result(result: &SearchResult, path: &Path) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(result)?;
    write_atomic(path, &bytes, false)
}

/// Load a search result from JSON
pub fn load_result(path: &Path) -> Result<SearchResult, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }

    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn read_existing(path: &Path) -> Result<String, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write to a temporary file, then rename over the destination
fn write_atomic(path: &Path, contents: &[u8], private: bool) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // A leftover temp file would keep its old permissions through the rename
    let temp_path = temp_path_for(path);
    match fs::remove_file(&temp_path) {
        Ok(()) => warn!("Removed stale temp file {:?}", temp_path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }

    let mut file = options.open(&temp_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Signature;
    use crate::mining::search;

    fn test_key_pair() -> KeyPair {
        KeyPair::generate(1024).unwrap()
    }

    #[test]
    fn test_persist_and_load_key_pair() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        let key_pair = test_key_pair();

        assert!(!store.exists());
        store.save(&key_pair).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, key_pair);
        assert_eq!(&store.load_public_key().unwrap(), key_pair.public_key());
    }

    #[test]
    fn test_loaded_keys_sign_and_verify_interchangeably() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        let key_pair = test_key_pair();
        store.save(&key_pair).unwrap();
        let loaded = store.load().unwrap();

        let message = b"egama0";
        let in_memory: Signature = key_pair.sign(message).unwrap();
        let from_disk = loaded.sign(message).unwrap();

        // PKCS#1 v1.5 is deterministic
        assert_eq!(in_memory, from_disk);
        assert!(loaded.verify(message, &in_memory).is_ok());
        assert!(key_pair.verify(message, &from_disk).is_ok());
    }

    #[test]
    fn test_persist_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let private_path = temp_dir.path().join("keys/secret/private_key.pem");
        let public_path = temp_dir.path().join("keys/public_key.pem");

        persist(&test_key_pair(), &private_path, &public_path).unwrap();
        assert!(private_path.exists());
        assert!(public_path.exists());
        assert!(!temp_path_for(&private_path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        store.save(&test_key_pair()).unwrap();

        let mode = fs::metadata(store.private_key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_temp_file_does_not_loosen_private_key_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());

        // Left behind by an interrupted write
        let stale = temp_path_for(&store.private_key_path());
        fs::write(&stale, "partial").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        let key_pair = test_key_pair();
        store.save(&key_pair).unwrap();

        let mode = fs::metadata(store.private_key_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
        assert!(!stale.exists());
        assert_eq!(store.load().unwrap(), key_pair);
    }

    #[test]
    fn test_overwrites_existing_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());

        store.save(&test_key_pair()).unwrap();
        let second = test_key_pair();
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn test_missing_key_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        assert!(matches!(store.load(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_corrupted_key_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        store.save(&test_key_pair()).unwrap();

        fs::write(store.private_key_path(), "garbage").unwrap();
        assert!(matches!(
            store.load(),
            Err(StorageError::KeyError(KeyError::InvalidPrivateKey(_)))
        ));
    }

    #[test]
    fn test_mismatched_key_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = KeyStore::in_dir(temp_dir.path());
        store.save(&test_key_pair()).unwrap();

        let other = test_key_pair();
        fs::write(store.public_key_path(), other.public_key_pem().unwrap()).unwrap();
        assert!(matches!(store.load(), Err(StorageError::KeyMismatch(_))));
    }

    #[test]
    fn test_save_load_result() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("proof.json");
        let result = search("egama", 2).unwrap();

        save_result(&result, &path).unwrap();
        let loaded = load_result(&path).unwrap();
        assert_eq!(loaded, result);
        assert!(loaded.is_valid());
    }

    #[test]
    fn test_load_missing_result() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(matches!(load_result(&path), Err(StorageError::NotFound(_))));
    }
}
