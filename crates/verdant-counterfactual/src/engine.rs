//! Counterfactual trajectory simulation.
//!
//! The hash pipeline runs in a strict order: collect input, splice in policy
//! version and simulation mode, simulate both trajectories, round every
//! numeric result to 8 decimals, canonicalize, hash. Reordering any step
//! changes the hash contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use verdant_deterministic::{
    canonicalize, round8, round_all_numbers, stable_hash, to_canonical_value, DEFAULT_PRECISION,
};

use crate::conflict::DisWeights;
use crate::error::SimulationError;

/// Sweep length used when the caller does not supply one.
pub const DEFAULT_SWEEP_RUNS: u32 = 100;

/// Risk-aversion coefficient in the regret objective.
const RISK_AVERSION: f64 = 0.3;
/// Notional unit price applied to expected yield.
const UNIT_PRICE: f64 = 1500.0;
/// Tail risk as a fraction of absolute profit.
const TAIL_FRACTION: f64 = 0.15;
/// Cost discount for a plan with no operations at all.
const IDLE_COST_FACTOR: f64 = 0.9;
/// Floor for the profit denominator in the risk score.
const PROFIT_FLOOR: f64 = 1e-6;
/// Stride of the sweep perturbation: sin(i * stride) over the run index.
const SWEEP_STRIDE: f64 = 1.618_033_988_749_895;
/// Amplitude of the sweep perturbation.
const SWEEP_AMPLITUDE: f64 = 0.1;
/// Extra tail fraction contributed by the perturbation magnitude.
const SWEEP_TAIL_FRACTION: f64 = 0.05;

/// How trajectories are evaluated. The sweep mode averages over a fixed
/// periodic perturbation of the run index, so it is reproducible by
/// construction; it is named after the original contract even though it is
/// not statistical sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    Deterministic,
    MonteCarlo,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Deterministic => "deterministic",
            SimulationMode::MonteCarlo => "monte_carlo",
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMode {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "deterministic" => Ok(SimulationMode::Deterministic),
            "monte_carlo" => Ok(SimulationMode::MonteCarlo),
            other => Err(SimulationError::UnknownMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Input to one counterfactual run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounterfactualInput {
    /// Snapshot of the AI draft: `yield_target`, `cost_estimate`,
    /// `operations` (each with an optional `efficiency`), and any other
    /// plan fields.
    pub snapshot: Value,
    /// Partial overlay shallow-merged over the snapshot for the human
    /// trajectory.
    pub human_action: Value,
    pub weights: DisWeights,
    /// Governance fact, part of the hash, never part of the numbers.
    pub policy_version: String,
    pub mode: SimulationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_runs: Option<u32>,
}

/// One simulated trajectory, every field rounded to the default precision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResult {
    pub expected_yield: f64,
    pub expected_cost: f64,
    pub estimated_profit: f64,
    pub tail_risk: f64,
    pub risk_score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounterfactualResult {
    pub ai: TrajectoryResult,
    pub human: TrajectoryResult,
    /// Objective(AI) - Objective(human), objective = profit - lambda * tail.
    pub regret: f64,
    pub mode: SimulationMode,
    pub simulation_hash: String,
    /// The exact canonical payload the hash was computed over.
    pub canonical_payload: String,
}

/// Runs counterfactual simulations. Stateless; safe to share across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct CounterfactualEngine;

impl CounterfactualEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, input: &CounterfactualInput) -> Result<CounterfactualResult, SimulationError> {
        let runs = input.sweep_runs.unwrap_or(DEFAULT_SWEEP_RUNS);

        let ai = simulate_trajectory(&input.snapshot, input.mode, runs)?;
        let human_plan = shallow_merge(&input.snapshot, &input.human_action);
        let human = simulate_trajectory(&human_plan, input.mode, runs)?;

        let objective_ai = ai.estimated_profit - RISK_AVERSION * ai.tail_risk;
        let objective_human = human.estimated_profit - RISK_AVERSION * human.tail_risk;
        let regret = round8(objective_ai - objective_human)?;

        let payload = json!({
            "input": {
                "snapshot": input.snapshot,
                "human_action": input.human_action,
                "weights": to_canonical_value(&input.weights)?,
                "policy_version": input.policy_version,
                "simulation_mode": input.mode.as_str(),
            },
            "ai_trajectory": to_canonical_value(&ai)?,
            "human_trajectory": to_canonical_value(&human)?,
            "regret": regret,
            "objective_ai": round8(objective_ai)?,
            "objective_human": round8(objective_human)?,
        });
        let rounded = round_all_numbers(&payload, DEFAULT_PRECISION)?;
        let canonical_payload = canonicalize(&rounded)?;
        let simulation_hash = stable_hash(&canonical_payload);

        info!(
            regret,
            mode = %input.mode,
            hash = %simulation_hash,
            "counterfactual simulation complete"
        );
        Ok(CounterfactualResult {
            ai,
            human,
            regret,
            mode: input.mode,
            simulation_hash,
            canonical_payload,
        })
    }
}

/// Shallow merge: top-level keys of the action overwrite the snapshot.
/// Non-object inputs fall back to the action side.
fn shallow_merge(snapshot: &Value, action: &Value) -> Value {
    match (snapshot, action) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => action.clone(),
    }
}

fn simulate_trajectory(
    plan: &Value,
    mode: SimulationMode,
    runs: u32,
) -> Result<TrajectoryResult, SimulationError> {
    let yield_target = number_field(plan, "yield_target");
    let cost_estimate = number_field(plan, "cost_estimate");
    let operations = plan
        .get("operations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    match mode {
        SimulationMode::Deterministic => {
            deterministic_trajectory(yield_target, cost_estimate, &operations)
        }
        SimulationMode::MonteCarlo => {
            sweep_trajectory(yield_target, cost_estimate, &operations, runs)
        }
    }
}

fn deterministic_trajectory(
    yield_target: f64,
    cost_estimate: f64,
    operations: &[Value],
) -> Result<TrajectoryResult, SimulationError> {
    let op_factor = if operations.is_empty() {
        1.0
    } else {
        operations
            .iter()
            .map(|op| op.get("efficiency").and_then(Value::as_f64).unwrap_or(1.0))
            .product()
    };

    let expected_yield = yield_target * op_factor;
    let expected_cost = cost_estimate * if operations.is_empty() { IDLE_COST_FACTOR } else { 1.0 };
    let estimated_profit = expected_yield * UNIT_PRICE - expected_cost;
    let tail_risk = estimated_profit.abs() * TAIL_FRACTION;
    let risk_score = (tail_risk / estimated_profit.abs().max(PROFIT_FLOOR)).min(1.0);

    Ok(TrajectoryResult {
        expected_yield: round8(expected_yield)?,
        expected_cost: round8(expected_cost)?,
        estimated_profit: round8(estimated_profit)?,
        tail_risk: round8(tail_risk)?,
        risk_score: round8(risk_score)?,
    })
}

/// Averaged sweep over a fixed perturbation of the run index. Identical
/// inputs and run count always produce the identical average.
fn sweep_trajectory(
    yield_target: f64,
    cost_estimate: f64,
    operations: &[Value],
    runs: u32,
) -> Result<TrajectoryResult, SimulationError> {
    let base = deterministic_trajectory(yield_target, cost_estimate, operations)?;
    let runs = runs.max(1);

    let mut sum_yield = 0.0;
    let mut sum_cost = 0.0;
    let mut sum_profit = 0.0;
    let mut sum_tail = 0.0;
    let mut sum_risk = 0.0;

    for i in 0..runs {
        let factor = (f64::from(i) * SWEEP_STRIDE).sin() * SWEEP_AMPLITUDE;
        let y = base.expected_yield * (1.0 + factor);
        let c = base.expected_cost * (1.0 - factor * 0.5);
        let p = y * UNIT_PRICE - c;
        let t = p.abs() * (TAIL_FRACTION + factor.abs() * SWEEP_TAIL_FRACTION);
        let r = (t / p.abs().max(PROFIT_FLOOR)).min(1.0);

        sum_yield += y;
        sum_cost += c;
        sum_profit += p;
        sum_tail += t;
        sum_risk += r;
    }

    let n = f64::from(runs);
    Ok(TrajectoryResult {
        expected_yield: round8(sum_yield / n)?,
        expected_cost: round8(sum_cost / n)?,
        estimated_profit: round8(sum_profit / n)?,
        tail_risk: round8(sum_tail / n)?,
        risk_score: round8(sum_risk / n)?,
    })
}

fn number_field(plan: &Value, key: &str) -> f64 {
    plan.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
