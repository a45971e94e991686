use std::fmt;

use thiserror::Error;

use verdant_deterministic::CanonicalError;
use verdant_draft::{ActorRole, DraftState};

/// A transition was denied. Each variant names the exact precondition that
/// failed; callers can supply better evidence and retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("transition {from} -> {to} is not whitelisted; allowed targets from {from}: {allowed:?}")]
    UnknownTransition {
        from: DraftState,
        to: DraftState,
        allowed: Vec<DraftState>,
    },

    #[error("transition {from} -> {to} requires a human actor, got {role}")]
    HumanRequired {
        from: DraftState,
        to: DraftState,
        role: ActorRole,
    },

    #[error("transition {from} -> {to} requires a recorded divergence reference")]
    DivergenceRecordRequired { from: DraftState, to: DraftState },

    #[error("divergence score {dis_score} exceeds the high-risk threshold; a justification is required")]
    JustificationRequired { dis_score: f64 },
}

/// One failed evidence check: the field, the bound it violated, and what was
/// actually supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceProblem {
    pub field: String,
    pub requirement: String,
    pub actual: String,
}

impl fmt::Display for EvidenceProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (got {})",
            self.field, self.requirement, self.actual
        )
    }
}

/// Storage-boundary failures. Uniqueness conflicts are not errors; they are
/// translated into the existing record's identity.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("divergence store lock poisoned")]
    LockPoisoned,
}

/// Errors raised while recording or verifying divergence evidence.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("divergence evidence failed validation: {}", format_problems(problems))]
    InvalidEvidence { problems: Vec<EvidenceProblem> },

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_problems(problems: &[EvidenceProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
