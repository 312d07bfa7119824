//! Lazy candidate generation for the proof-of-work search

/// A single search candidate: `seed` followed by the decimal nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub nonce: u64,
    pub input: String,
}

/// Infinite sequence of candidates `seed0`, `seed1`, `seed2`, ...
///
/// The sequence only ends once the `u64` nonce space is exhausted.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    seed: &'a str,
    next_nonce: Option<u64>,
}

impl<'a> Candidates<'a> {
    pub fn new(seed: &'a str) -> Self {
        Self::starting_at(seed, 0)
    }

    /// Start the sequence at an arbitrary nonce
    pub fn starting_at(seed: &'a str, nonce: u64) -> Self {
        Self {
            seed,
            next_nonce: Some(nonce),
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let nonce = self.next_nonce?;
        self.next_nonce = nonce.checked_add(1);

        let mut input = String::with_capacity(self.seed.len() + 20);
        input.push_str(self.seed);
        input.push_str(&nonce.to_string());

        Some(Candidate { nonce, input })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_sequence() {
        let inputs: Vec<String> = Candidates::new("egama").take(12).map(|c| c.input).collect();
        assert_eq!(inputs[0], "egama0");
        assert_eq!(inputs[1], "egama1");
        assert_eq!(inputs[10], "egama10");
        assert_eq!(inputs[11], "egama11");
    }

    #[test]
    fn test_empty_seed() {
        let first = Candidates::new("").next().unwrap();
        assert_eq!(first, Candidate { nonce: 0, input: "0".to_string() });
    }

    #[test]
    fn test_sequence_ends_at_nonce_space() {
        let mut candidates = Candidates::starting_at("x", u64::MAX - 1);
        assert_eq!(candidates.next().unwrap().nonce, u64::MAX - 1);
        let last = candidates.next().unwrap();
        assert_eq!(last.input, format!("x{}", u64::MAX));
        assert!(candidates.next().is_none());
    }
}
