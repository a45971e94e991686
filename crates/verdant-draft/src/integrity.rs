//! Integrity gate for generated drafts and persisted generation records.
//!
//! The gate re-derives everything it checks; it never trusts a stored flag.

use tracing::warn;

use verdant_deterministic::{
    assert_idempotent, is_stable_hash, verify_generation_hash, CanonicalError, Seed,
};

use crate::error::GenerationError;
use crate::types::{DraftState, GeneratedDraft};

/// Validates drafts and generation records against the determinism contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegrityGate;

impl IntegrityGate {
    pub fn new() -> Self {
        Self
    }

    /// Full check of a freshly generated draft: structural shape, seed and
    /// hash formats, canonical idempotence, and the generation hash itself.
    /// All problems are collected before failing.
    pub fn validate_generated(
        &self,
        draft: &GeneratedDraft,
        canonical_payload: &str,
    ) -> Result<(), GenerationError> {
        let mut problems = Vec::new();

        if draft.state != DraftState::GeneratedDraft {
            problems.push(format!(
                "state is {}, expected generated_draft",
                draft.state
            ));
        }
        if Seed::parse_explicit(&draft.metadata.seed).is_err() {
            problems.push(format!("seed {:?} is not a uint32 string", draft.metadata.seed));
        }
        if !is_stable_hash(&draft.metadata.hash) {
            problems.push("hash is not 64 lowercase hex characters".to_string());
        }
        for (index, stage) in draft.stages.iter().enumerate() {
            if stage.sequence != index as u32 + 1 {
                problems.push(format!(
                    "stage {:?} has sequence {}, expected {}",
                    stage.name,
                    stage.sequence,
                    index + 1
                ));
            }
            if stage.operations.is_empty() {
                problems.push(format!("stage {:?} has no operations", stage.name));
            }
        }

        if let Err(error) = assert_idempotent(canonical_payload) {
            problems.push(error.to_string());
        }

        if !problems.is_empty() {
            warn!(count = problems.len(), "draft failed integrity validation");
            return Err(GenerationError::InvalidDraft { problems });
        }

        if !verify_generation_hash(
            canonical_payload,
            &draft.metadata.model_version,
            &draft.metadata.seed,
            &draft.metadata.hash,
        ) {
            let recomputed = verdant_deterministic::generation_hash(
                canonical_payload,
                &draft.metadata.model_version,
                &draft.metadata.seed,
            );
            warn!(
                declared = %draft.metadata.hash,
                recomputed = %recomputed,
                "generation hash mismatch"
            );
            return Err(GenerationError::Integrity {
                declared: draft.metadata.hash.clone(),
                recomputed,
            });
        }
        Ok(())
    }

    /// Re-verifies a persisted generation record: the stored canonical payload
    /// must still be canonical, and the stored hash must match a recomputation.
    pub fn verify_record(
        &self,
        canonical_payload: &str,
        model_version: &str,
        seed: &str,
        declared_hash: &str,
    ) -> Result<bool, CanonicalError> {
        assert_idempotent(canonical_payload)?;
        Ok(verify_generation_hash(
            canonical_payload,
            model_version,
            seed,
            declared_hash,
        ))
    }
}
