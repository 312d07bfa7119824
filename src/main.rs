//! pow-rsa CLI Application
//!
//! Runs the proof-of-work search and the RSA sign/verify pipeline.

use clap::{Parser, Subcommand};
use pow_rsa::cli::{self, CliResult, MessageSource, PipelineConfig};
use pow_rsa::crypto::DEFAULT_MODULUS_BITS;
use pow_rsa::mining::{SearchLimits, DEFAULT_DIFFICULTY, DEFAULT_SEED};
use pow_rsa::storage::{KeyStore, KeyStoreConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pow-rsa")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "SHA-256 proof of work signed with RSA", long_about = None)]
struct Cli {
    /// Directory holding private_key.pem and public_key.pem
    #[arg(short, long, global = true, default_value = ".")]
    key_dir: PathBuf,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate keys, mine, sign the result and verify the signature
    Run {
        /// Seed the nonce is appended to
        #[arg(short, long, default_value = DEFAULT_SEED)]
        seed: String,

        /// Number of leading zero hex digits
        #[arg(short, long, default_value_t = DEFAULT_DIFFICULTY)]
        difficulty: u32,

        /// RSA modulus size
        #[arg(short, long, default_value_t = DEFAULT_MODULUS_BITS)]
        bits: usize,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Give up after this many hash attempts
        #[arg(long)]
        max_attempts: Option<u64>,
    },

    /// Search for proofs of work only
    Mine {
        /// Seed the nonce is appended to
        #[arg(short, long, default_value = DEFAULT_SEED)]
        seed: String,

        /// Difficulty levels to run, in order (repeatable)
        #[arg(short, long = "difficulty", default_values_t = [DEFAULT_DIFFICULTY])]
        difficulties: Vec<u32>,

        /// Save the last proof as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Give up after this many hash attempts
        #[arg(long)]
        max_attempts: Option<u64>,
    },

    /// Generate and store a new RSA key pair
    Keygen {
        /// RSA modulus size
        #[arg(short, long, default_value_t = DEFAULT_MODULUS_BITS)]
        bits: usize,
    },

    /// Sign a message with the stored private key
    Sign {
        /// Message text
        #[arg(short, long)]
        message: Option<String>,

        /// Use the input of a saved proof as the message
        #[arg(short, long)]
        proof: Option<PathBuf>,
    },

    /// Verify a signature with the stored public key
    Verify {
        /// Message text
        #[arg(short, long)]
        message: Option<String>,

        /// Use the input of a saved proof as the message
        #[arg(short, long)]
        proof: Option<PathBuf>,

        /// Hex-encoded signature
        #[arg(long)]
        signature: String,
    },
}

fn search_limits(timeout_secs: Option<u64>, max_attempts: Option<u64>) -> SearchLimits {
    SearchLimits {
        max_attempts,
        timeout: timeout_secs.map(Duration::from_secs),
        cancel: None,
    }
}

fn message_source(message: Option<String>, proof: Option<PathBuf>) -> CliResult<MessageSource> {
    match (message, proof) {
        (Some(text), None) => Ok(MessageSource::Text(text)),
        (None, Some(path)) => Ok(MessageSource::Proof(path)),
        _ => Err("Pass exactly one of --message or --proof".into()),
    }
}

fn main() -> CliResult<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let key_store = KeyStoreConfig {
        dir: cli.key_dir,
        ..Default::default()
    };
    let store = KeyStore::new(key_store.clone());

    let command = cli.command.unwrap_or(Commands::Run {
        seed: DEFAULT_SEED.to_string(),
        difficulty: DEFAULT_DIFFICULTY,
        bits: DEFAULT_MODULUS_BITS,
        timeout_secs: None,
        max_attempts: None,
    });

    match command {
        Commands::Run {
            seed,
            difficulty,
            bits,
            timeout_secs,
            max_attempts,
        } => {
            let config = PipelineConfig {
                seed,
                difficulty,
                modulus_bits: bits,
                limits: search_limits(timeout_secs, max_attempts),
                key_store,
            };
            cli::cmd_run(&config)?;
        }

        Commands::Mine {
            seed,
            difficulties,
            output,
            timeout_secs,
            max_attempts,
        } => {
            let limits = search_limits(timeout_secs, max_attempts);
            cli::cmd_mine(&seed, &difficulties, limits, output.as_deref())?;
        }

        Commands::Keygen { bits } => {
            cli::cmd_keygen(&store, bits)?;
        }

        Commands::Sign { message, proof } => {
            cli::cmd_sign(&store, &message_source(message, proof)?)?;
        }

        Commands::Verify {
            message,
            proof,
            signature,
        } => {
            cli::cmd_verify(&store, &message_source(message, proof)?, &signature)?;
        }
    }

    Ok(())
}
