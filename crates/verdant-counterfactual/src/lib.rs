//! # verdant-counterfactual
//!
//! Comparative analysis of an AI plan against a human override: both
//! trajectories are simulated through the same model, per-trajectory risk is
//! assessed, divergence is scored across four bounded factors, and every
//! result is rounded, canonicalized, and hashed so that re-running the same
//! analysis always reproduces the same simulation hash.
//!
//! Governance context (policy version, simulation mode) is spliced into the
//! hashed payload before any number is computed; it shapes the hash even
//! though it never shapes the simulated values.

#![deny(unsafe_code)]

pub mod conflict;
pub mod engine;
pub mod error;
pub mod explain;
pub mod risk;

pub use conflict::{divergence_score, ConflictInput, ConflictVector, DisWeights};
pub use engine::{
    CounterfactualEngine, CounterfactualInput, CounterfactualResult, SimulationMode,
    TrajectoryResult, DEFAULT_SWEEP_RUNS,
};
pub use error::SimulationError;
pub use explain::{build_breakdown, ConflictBreakdown, ExplainInput, FactorContribution, Recommendation};
pub use risk::{OverrideRiskAnalyzer, RiskAssessment, RiskBreakdown, RiskInput};
