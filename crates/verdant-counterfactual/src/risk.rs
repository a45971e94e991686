//! Per-trajectory risk metrics and the override risk analyzer.
//!
//! The analyzer never propagates a computation failure: a failed or
//! over-budget risk calculation degrades to a flagged all-zero result so that
//! governance can still take a conservative decision.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use verdant_deterministic::{
    canonicalize, round8, round_all_numbers, stable_hash, to_canonical_value, DEFAULT_PRECISION,
};

use crate::engine::SimulationMode;
use crate::error::SimulationError;

const YIELD_WEIGHT: f64 = 0.4;
const FINANCIAL_WEIGHT: f64 = 0.35;
const COMPLIANCE_WEIGHT: f64 = 0.25;
/// Floor for relative-risk denominators.
const EPSILON: f64 = 1e-6;
/// Soft wall-clock budget; overrun triggers the fallback, not cancellation.
const DEFAULT_BUDGET: Duration = Duration::from_millis(200);

/// Inputs for one trajectory's risk assessment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RiskInput {
    pub expected_yield: f64,
    pub actual_yield: f64,
    pub expected_cost: f64,
    pub actual_cost: f64,
    /// Compliance score in [0, 1]; risk is its complement.
    pub compliance_score: f64,
}

/// The three component risks and their weighted aggregate, all in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub yield_risk: f64,
    pub financial_risk: f64,
    pub compliance_risk: f64,
    pub aggregate: f64,
}

impl RiskBreakdown {
    fn zero() -> Self {
        Self {
            yield_risk: 0.0,
            financial_risk: 0.0,
            compliance_risk: 0.0,
            aggregate: 0.0,
        }
    }
}

/// Pure risk assessment for one trajectory. Non-finite input is the one
/// failure mode; the analyzer translates it into the fallback.
pub fn assess(input: &RiskInput) -> Option<RiskBreakdown> {
    let fields = [
        input.expected_yield,
        input.actual_yield,
        input.expected_cost,
        input.actual_cost,
        input.compliance_score,
    ];
    if fields.iter().any(|value| !value.is_finite()) {
        return None;
    }

    let yield_risk = ((input.actual_yield - input.expected_yield).abs()
        / input.expected_yield.abs().max(EPSILON))
    .clamp(0.0, 1.0);
    // Upside-only: a cost saving is not a financial risk.
    let financial_risk = ((input.actual_cost - input.expected_cost).max(0.0)
        / input.expected_cost.abs().max(EPSILON))
    .clamp(0.0, 1.0);
    let compliance_risk = (1.0 - input.compliance_score).clamp(0.0, 1.0);

    let aggregate = (YIELD_WEIGHT * yield_risk
        + FINANCIAL_WEIGHT * financial_risk
        + COMPLIANCE_WEIGHT * compliance_risk)
        .clamp(0.0, 1.0);

    Some(RiskBreakdown {
        yield_risk,
        financial_risk,
        compliance_risk,
        aggregate,
    })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Risk(human) - Risk(AI), clamped to [-1, 1].
    pub delta_risk: f64,
    pub ai: RiskBreakdown,
    pub human: RiskBreakdown,
    pub simulation_hash: String,
    pub is_system_fallback: bool,
    pub policy_version: String,
    pub canonical_payload: String,
}

/// Computes the risk delta of a human override against the AI trajectory,
/// with the same hash pipeline as the counterfactual engine.
#[derive(Clone, Debug)]
pub struct OverrideRiskAnalyzer {
    policy_version: String,
    mode: SimulationMode,
    budget: Duration,
}

impl OverrideRiskAnalyzer {
    pub fn new(policy_version: impl Into<String>, mode: SimulationMode) -> Self {
        Self {
            policy_version: policy_version.into(),
            mode,
            budget: DEFAULT_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn analyze(
        &self,
        ai_draft: &RiskInput,
        human_override: &RiskInput,
    ) -> Result<RiskAssessment, SimulationError> {
        let started = Instant::now();

        let (ai, human, is_system_fallback) = match (assess(ai_draft), assess(human_override)) {
            (Some(ai), Some(human)) if started.elapsed() <= self.budget => (ai, human, false),
            (Some(_), Some(_)) => {
                warn!(
                    budget_ms = self.budget.as_millis() as u64,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "risk computation exceeded its budget, using fallback"
                );
                (RiskBreakdown::zero(), RiskBreakdown::zero(), true)
            }
            _ => {
                warn!("risk computation failed, using fallback");
                (RiskBreakdown::zero(), RiskBreakdown::zero(), true)
            }
        };

        let delta_risk = round8((human.aggregate - ai.aggregate).clamp(-1.0, 1.0))?;

        let payload = json!({
            "input": {
                "ai_draft": to_canonical_value(ai_draft)?,
                "human_override": to_canonical_value(human_override)?,
                "policy_version": self.policy_version,
                "simulation_mode": self.mode.as_str(),
            },
            "ai_risk": to_canonical_value(&ai)?,
            "human_risk": to_canonical_value(&human)?,
            "delta_risk": delta_risk,
            "is_system_fallback": is_system_fallback,
        });
        let rounded = round_all_numbers(&payload, DEFAULT_PRECISION)?;
        let canonical_payload = canonicalize(&rounded)?;
        let simulation_hash = stable_hash(&canonical_payload);

        info!(
            delta_risk,
            fallback = is_system_fallback,
            hash = %simulation_hash,
            "override risk analysis complete"
        );
        Ok(RiskAssessment {
            delta_risk,
            ai,
            human,
            simulation_hash,
            is_system_fallback,
            policy_version: self.policy_version.clone(),
            canonical_payload,
        })
    }
}
