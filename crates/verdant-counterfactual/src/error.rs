use thiserror::Error;

use verdant_deterministic::{CanonicalError, RoundingError};

/// Errors raised by the simulation and risk hash pipelines.
///
/// Risk *degradation* is deliberately not represented here; a degraded
/// analysis is a flagged fallback result, not an error.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Rounding(#[from] RoundingError),

    #[error("unrecognized simulation mode: {value:?}")]
    UnknownMode { value: String },
}
