use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::seed::Seed;

/// Randomness was requested inside a deterministic scope. Always fatal and
/// surfaced immediately; there is no fallback entropy source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("entropy requested inside a deterministic scope")]
pub struct EntropyViolation;

/// Time capability. Deterministic scopes receive a frozen implementation
/// instead of reading the process clock.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Entropy capability. Deterministic scopes receive an implementation that
/// refuses every request.
pub trait EntropySource {
    fn next_f64(&self) -> Result<f64, EntropyViolation>;
}

/// A clock pinned to a single instant; every query returns the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrozenClock {
    instant: DateTime<Utc>,
}

impl FrozenClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// An entropy source that raises [`EntropyViolation`] on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeniedEntropy;

impl EntropySource for DeniedEntropy {
    fn next_f64(&self) -> Result<f64, EntropyViolation> {
        Err(EntropyViolation)
    }
}

/// The capabilities available to a unit of deterministic work: a clock frozen
/// at the seed-derived timestamp and a denied entropy source. Built on entry
/// to a generation scope and dropped on every exit path.
pub struct DeterministicContext {
    clock: FrozenClock,
    entropy: DeniedEntropy,
}

impl DeterministicContext {
    pub fn for_seed(seed: &Seed) -> Self {
        Self {
            clock: FrozenClock::at(seed.timestamp()),
            entropy: DeniedEntropy,
        }
    }

    /// The frozen time-of-day; consistent for the life of the scope.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &FrozenClock {
        &self.clock
    }

    pub fn entropy(&self) -> &DeniedEntropy {
        &self.entropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_is_consistent() {
        let seed = Seed::parse_explicit("42").unwrap();
        let ctx = DeterministicContext::for_seed(&seed);
        let first = ctx.now();
        let second = ctx.now();
        assert_eq!(first, second);
        assert_eq!(first, seed.timestamp());
    }

    #[test]
    fn entropy_request_is_a_violation() {
        let seed = Seed::parse_explicit("42").unwrap();
        let ctx = DeterministicContext::for_seed(&seed);
        assert_eq!(ctx.entropy().next_f64(), Err(EntropyViolation));
    }

    #[test]
    fn same_seed_same_frozen_instant() {
        let seed = Seed::parse_explicit("7").unwrap();
        let a = DeterministicContext::for_seed(&seed);
        let b = DeterministicContext::for_seed(&seed);
        assert_eq!(a.now(), b.now());
    }
}
