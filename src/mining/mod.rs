//! Mining module for the proof-of-work search

pub mod candidates;
pub mod miner;

pub use candidates::{Candidate, Candidates};
pub use miner::{
    search, CancelFlag, Miner, MiningError, MiningStats, SearchLimits, SearchResult,
    DEFAULT_DIFFICULTY, DEFAULT_SEED, MAX_DIFFICULTY,
};
