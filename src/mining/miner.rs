//! Proof-of-work search engine
//!
//! Finds the smallest nonce such that `SHA-256(seed + nonce)` starts with
//! the required number of zero hex digits.

use crate::crypto::{meets_difficulty, sha256_hex, DIGEST_HEX_LEN};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::candidates::Candidates;

/// Seed used when the caller does not supply one
pub const DEFAULT_SEED: &str = "egama";

/// Default number of leading zero hex digits
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Highest satisfiable difficulty (one zero per hex digit of the digest)
pub const MAX_DIFFICULTY: u32 = DIGEST_HEX_LEN as u32;

/// Attempts between progress log lines
const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Mining errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("Invalid difficulty: {difficulty} (max: {max})")]
    InvalidDifficulty { difficulty: u32, max: u32 },
    #[error("Search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
    #[error("Nonce space exhausted after {attempts} attempts")]
    Exhausted { attempts: u64 },
}

/// Shared flag another unit of work can set to stop a running search
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a single search. All limits are checked before every attempt.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    /// Maximum number of digests to compute
    pub max_attempts: Option<u64>,
    /// Maximum wall-clock time
    pub timeout: Option<Duration>,
    /// External cancellation signal
    pub cancel: Option<CancelFlag>,
}

impl SearchLimits {
    /// No limits: the search runs until it finds a match
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_exceeded(&self, attempts: u64, start: Instant) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return true;
        }
        if self.timeout.is_some_and(|timeout| start.elapsed() >= timeout) {
            return true;
        }
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// A successful proof-of-work search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Winning input (`seed` followed by the decimal nonce)
    pub input: String,
    /// Lowercase hex SHA-256 of `input`
    pub digest_hex: String,
    pub nonce: u64,
    /// Difficulty the search was run at
    pub difficulty: u32,
}

impl SearchResult {
    /// Recompute the digest and check it against the recorded difficulty
    pub fn is_valid(&self) -> bool {
        self.difficulty <= MAX_DIFFICULTY
            && sha256_hex(self.input.as_bytes()) == self.digest_hex
            && meets_difficulty(&self.digest_hex, self.difficulty)
    }

    /// Check that `input` is `seed` followed by `nonce`
    pub fn matches_seed(&self, seed: &str) -> bool {
        self.input
            .strip_prefix(seed)
            .is_some_and(|rest| rest == self.nonce.to_string())
    }
}

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub attempts: u64,
    /// Wall-clock time spent searching
    pub elapsed: Duration,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

impl MiningStats {
    fn new(attempts: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let hash_rate = if secs > 0.0 {
            attempts as f64 / secs
        } else {
            attempts as f64
        };

        Self {
            attempts,
            elapsed,
            hash_rate,
        }
    }
}

/// Proof-of-work searcher
#[derive(Debug, Clone, Default)]
pub struct Miner {
    limits: SearchLimits,
}

impl Miner {
    /// Create a miner with the given limits
    pub fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    /// Find the first nonce whose digest meets `difficulty`
    pub fn search(&self, seed: &str, difficulty: u32) -> Result<SearchResult, MiningError> {
        self.search_with_stats(seed, difficulty)
            .map(|(result, _)| result)
    }

    /// Same as [`Miner::search`], also returning timing statistics
    pub fn search_with_stats(
        &self,
        seed: &str,
        difficulty: u32,
    ) -> Result<(SearchResult, MiningStats), MiningError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(MiningError::InvalidDifficulty {
                difficulty,
                max: MAX_DIFFICULTY,
            });
        }

        info!(
            "Searching for a digest with {} leading zeros (seed {:?})...",
            difficulty, seed
        );

        let start = Instant::now();
        let mut attempts = 0u64;

        for candidate in Candidates::new(seed) {
            if self.limits.is_exceeded(attempts, start) {
                info!("Search stopped after {} attempts", attempts);
                return Err(MiningError::Cancelled { attempts });
            }

            let digest_hex = sha256_hex(candidate.input.as_bytes());
            attempts += 1;

            if meets_difficulty(&digest_hex, difficulty) {
                let stats = MiningStats::new(attempts, start.elapsed());
                info!(
                    "Found nonce {} in {:?} ({} attempts, {:.2} H/s)",
                    candidate.nonce, stats.elapsed, attempts, stats.hash_rate
                );

                let result = SearchResult {
                    input: candidate.input,
                    digest_hex,
                    nonce: candidate.nonce,
                    difficulty,
                };
                return Ok((result, stats));
            }

            if attempts % PROGRESS_INTERVAL == 0 {
                debug!(
                    "{} attempts, {:.0}s elapsed",
                    attempts,
                    start.elapsed().as_secs_f64()
                );
            }
        }

        Err(MiningError::Exhausted { attempts })
    }

    /// Run one search per difficulty level, in order
    pub fn search_many(
        &self,
        seed: &str,
        difficulties: &[u32],
    ) -> Result<Vec<(SearchResult, MiningStats)>, MiningError> {
        difficulties
            .iter()
            .map(|&difficulty| self.search_with_stats(seed, difficulty))
            .collect()
    }
}

/// Find the first nonce whose digest meets `difficulty`, with no limits
pub fn search(seed: &str, difficulty: u32) -> Result<SearchResult, MiningError> {
    Miner::default().search(seed, difficulty)
}
