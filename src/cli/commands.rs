//! CLI commands
//!
//! Implements the command handlers behind the `pow-rsa` binary. Every
//! handler reports to the console and propagates the first error it hits.

use crate::crypto::{KeyPair, Signature, DEFAULT_MODULUS_BITS};
use crate::mining::{
    Miner, MiningStats, SearchLimits, SearchResult, DEFAULT_DIFFICULTY, DEFAULT_SEED,
};
use crate::storage::{self, KeyStore, KeyStoreConfig};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Settings for the full keygen → mine → sign → verify pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub seed: String,
    pub difficulty: u32,
    pub modulus_bits: usize,
    pub limits: SearchLimits,
    pub key_store: KeyStoreConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_string(),
            difficulty: DEFAULT_DIFFICULTY,
            modulus_bits: DEFAULT_MODULUS_BITS,
            limits: SearchLimits::unlimited(),
            key_store: KeyStoreConfig::default(),
        }
    }
}

/// Everything the pipeline produced
#[derive(Debug)]
pub struct PipelineReport {
    pub key_pair: KeyPair,
    pub result: SearchResult,
    pub stats: MiningStats,
    pub signature: Signature,
}

/// Where the message to sign or verify comes from
#[derive(Debug, Clone)]
pub enum MessageSource {
    /// Literal text
    Text(String),
    /// The winning input of a saved proof
    Proof(PathBuf),
}

impl MessageSource {
    /// Resolve to the message text, checking saved proofs before use
    pub fn resolve(&self) -> CliResult<String> {
        match self {
            MessageSource::Text(text) => Ok(text.clone()),
            MessageSource::Proof(path) => {
                let result = storage::load_result(path)?;
                if !result.is_valid() {
                    return Err(format!("Proof in {:?} is invalid", path).into());
                }
                Ok(result.input)
            }
        }
    }
}

/// Generate keys, search, sign the winning input and verify the signature
pub fn cmd_run(config: &PipelineConfig) -> CliResult<PipelineReport> {
    let store = KeyStore::new(config.key_store.clone());

    // 1. Key pair
    let key_pair = KeyPair::generate(config.modulus_bits)?;
    store.save(&key_pair)?;

    println!("🔐 RSA key pair generated ({} bits)", key_pair.modulus_bits());
    println!("   ├─ Private key: {}", store.private_key_path().display());
    println!("   └─ Public key:  {}", store.public_key_path().display());

    // 2. Proof of work
    let miner = Miner::new(config.limits.clone());
    let (result, stats) = miner.search_with_stats(&config.seed, config.difficulty)?;
    print_result(&result, &stats);

    // 3. Sign
    let signature = key_pair.sign(result.input.as_bytes())?;
    println!("\n✍️  Signature: {}", signature);

    // 4. Verify
    key_pair.verify(result.input.as_bytes(), &signature)?;
    println!("\n✅ Signature verified!");

    Ok(PipelineReport {
        key_pair,
        result,
        stats,
        signature,
    })
}

/// Run the search once per difficulty level
pub fn cmd_mine(
    seed: &str,
    difficulties: &[u32],
    limits: SearchLimits,
    output: Option<&Path>,
) -> CliResult<Vec<SearchResult>> {
    println!("⛏️  Searching {:?} at difficulties {:?}...", seed, difficulties);
    let found = Miner::new(limits).search_many(seed, difficulties)?;

    let mut results = Vec::with_capacity(found.len());
    for (result, stats) in found {
        print_result(&result, &stats);
        results.push(result);
    }
    println!();

    if let (Some(path), Some(last)) = (output, results.last()) {
        storage::save_result(last, path)?;
        println!("📦 Proof saved to {:?}", path);
    }

    Ok(results)
}

/// Generate a key pair and store it
pub fn cmd_keygen(store: &KeyStore, modulus_bits: usize) -> CliResult<KeyPair> {
    let key_pair = KeyPair::generate(modulus_bits)?;
    store.save(&key_pair)?;

    println!("🔐 RSA key pair generated ({} bits)", key_pair.modulus_bits());
    println!("   ├─ Private key: {}", store.private_key_path().display());
    println!("   └─ Public key:  {}", store.public_key_path().display());
    println!("\n   ⚠️  IMPORTANT: Keep the private key file secret and backed up!");

    Ok(key_pair)
}

/// Sign a message with the stored private key
pub fn cmd_sign(store: &KeyStore, message: &MessageSource) -> CliResult<Signature> {
    let message = message.resolve()?;
    let key_pair = store.load()?;
    let signature = key_pair.sign(message.as_bytes())?;

    println!("✍️  Signed {:?}", message);
    println!("{}", signature);

    Ok(signature)
}

/// Verify a hex signature with the stored public key
pub fn cmd_verify(
    store: &KeyStore,
    message: &MessageSource,
    signature_hex: &str,
) -> CliResult<()> {
    let message = message.resolve()?;
    let public_key = store.load_public_key()?;
    let signature = Signature::from_hex(signature_hex)?;

    match crate::crypto::verify(&public_key, message.as_bytes(), &signature) {
        Ok(()) => {
            println!("✅ Signature is valid for {:?}", message);
            Ok(())
        }
        Err(e) => {
            println!("❌ Signature is NOT valid for {:?}", message);
            Err(e.into())
        }
    }
}

fn print_result(result: &SearchResult, stats: &MiningStats) {
    println!("\n   Found a hash with {} leading zeros!", result.difficulty);
    println!("   ├─ Input: {}", result.input);
    println!("   ├─ Hash: {}", result.digest_hex);
    println!("   ├─ Nonce: {}", result.nonce);
    println!("   ├─ Time: {:?}", stats.elapsed);
    println!("   └─ Hash rate: {:.2} H/s", stats.hash_rate);
}
