//! # verdant-deterministic
//!
//! The deterministic substrate for plan generation and override analysis:
//! every governance artifact in Verdant is hashed over a canonical byte form,
//! so identical logical input must produce identical bytes across unbounded
//! repeated invocations.
//!
//! ## Components
//!
//! - **Canonical form** — one unique serialized string per logically-equal
//!   value: recursive key sort, order-preserving arrays, null omission, NFC
//!   strings, 6-decimal floats.
//! - **Stable hashing** — blake3 over UTF-8 bytes, 64 lowercase hex chars,
//!   plus the `payload|version|seed` generation-hash contract.
//! - **Rounding policy** — round-half-to-even at a configurable precision
//!   (default 8), applied to every numeric leaf before hashing.
//! - **Seed** — a u32 derived from the canonical input digest, or validated
//!   from an explicit decimal string. There is no random fallback.
//! - **Deterministic context** — frozen clock and denied entropy capabilities
//!   injected into generation scopes instead of patched globals.

#![deny(unsafe_code)]

pub mod canonical;
pub mod context;
pub mod hash;
pub mod round;
pub mod seed;

pub use canonical::{assert_idempotent, canonicalize, to_canonical_value, CanonicalError};
pub use context::{Clock, DeniedEntropy, DeterministicContext, EntropySource, EntropyViolation, FrozenClock};
pub use hash::{generation_hash, is_stable_hash, stable_hash, verify_generation_hash, HASH_HEX_LEN};
pub use round::{round8, round_all_numbers, round_half_to_even, RoundingError, DEFAULT_PRECISION, MAX_PRECISION};
pub use seed::{Seed, SeedError};
