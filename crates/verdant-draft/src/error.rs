use thiserror::Error;

use verdant_deterministic::{CanonicalError, SeedError};

use crate::constraints::ConstraintViolation;

/// Errors raised by the draft generation pipeline.
///
/// Every variant aborts the generation; no draft is released on any failure
/// path.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("invalid generation input: {}", problems.join("; "))]
    InvalidInput { problems: Vec<String> },

    #[error("draft violates {} strategy constraint(s)", violations.len())]
    ConstraintViolations { violations: Vec<ConstraintViolation> },

    #[error("generation hash mismatch: declared {declared}, recomputed {recomputed}")]
    Integrity { declared: String, recomputed: String },

    #[error("generated draft failed validation: {}", problems.join("; "))]
    InvalidDraft { problems: Vec<String> },
}
