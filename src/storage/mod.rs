//! Storage module for key and proof persistence

pub mod persistence;

pub use persistence::{
    load_key_pair, load_private_key, load_public_key, load_result, persist, save_result,
    KeyStore, KeyStoreConfig, StorageError,
};
