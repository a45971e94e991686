use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Unix timestamp of 2025-01-01T00:00:00Z, the base for seed-derived
/// generation timestamps.
const GENERATION_EPOCH_SECS: i64 = 1_735_689_600;

/// Errors raised while deriving or validating a seed.
///
/// Seed resolution never falls back to a non-deterministic source; every
/// failure here is fatal to the calling generation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("canonical input for seed derivation is empty or blank")]
    EmptyCanonicalInput,

    #[error("explicit seed {value:?} is not a base-10 unsigned 32-bit integer")]
    InvalidExplicitSeed { value: String },
}

/// A generation seed: an unsigned 32-bit integer carried as a decimal string
/// in metadata and records. Created once per generation, immutable after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Seed(u32);

impl Seed {
    /// Derives a seed from a canonical input string: the first four bytes of
    /// the stable digest, read big-endian.
    pub fn derive(canonical_input: &str) -> Result<Self, SeedError> {
        if canonical_input.trim().is_empty() {
            return Err(SeedError::EmptyCanonicalInput);
        }
        let digest = blake3::hash(canonical_input.as_bytes());
        let bytes = digest.as_bytes();
        Ok(Self(u32::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ])))
    }

    /// Validates an explicit seed: a base-10 string in [0, 2^32).
    pub fn parse_explicit(value: &str) -> Result<Self, SeedError> {
        value
            .parse::<u32>()
            .map(Self)
            .map_err(|_| SeedError::InvalidExplicitSeed {
                value: value.to_string(),
            })
    }

    /// Resolution policy: an explicit seed wins when supplied, otherwise the
    /// seed is derived from the canonical input.
    pub fn resolve(canonical_input: &str, explicit: Option<&str>) -> Result<Self, SeedError> {
        match explicit {
            Some(value) => Self::parse_explicit(value),
            None => Self::derive(canonical_input),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Fixed generation timestamp: a constant epoch offset by the seed in
    /// seconds. No wall-clock read.
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(GENERATION_EPOCH_SECS + i64::from(self.0), 0)
            .unwrap_or_default()
    }

    /// Deterministic value sequence in [0, 1), mulberry32 over the seed.
    /// The same seed always yields the same sequence.
    pub fn sequence(&self, len: usize) -> Vec<f64> {
        let mut state = self.0;
        (0..len)
            .map(|_| {
                state = state.wrapping_add(0x6D2B_79F5);
                let mut t = (state ^ (state >> 15)).wrapping_mul(1 | state);
                t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
                f64::from(t ^ (t >> 14)) / 4_294_967_296.0
            })
            .collect()
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
