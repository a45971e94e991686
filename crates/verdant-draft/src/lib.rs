//! # verdant-draft
//!
//! Deterministic generation of plan drafts. A draft is produced by a strict
//! pipeline — canonicalize the seed-relevant parameters, resolve the seed,
//! freeze time, build metadata, assemble stages, propagate constraints, then
//! self-verify the generation hash — so that identical logical input always
//! yields a byte-identical draft and hash. A draft that fails any step is
//! never released; there is no partially-valid draft.

#![deny(unsafe_code)]

pub mod constraints;
pub mod error;
pub mod factory;
pub mod generator;
pub mod integrity;
pub mod types;

pub use constraints::ConstraintViolation;
pub use error::GenerationError;
pub use generator::{DeterministicGenerator, GenerationOutput};
pub use integrity::IntegrityGate;
pub use types::{
    ActorRole, ConstraintOp, DraftState, GeneratedDraft, GeneratedOperation, GeneratedResource,
    GeneratedStage, GenerationMetadata, GenerationParams, OperationTemplate, ResourceTemplate,
    StrategyConstraint,
};
