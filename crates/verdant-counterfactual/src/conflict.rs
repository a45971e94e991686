//! Conflict matrix: four bounded divergence factors and their weighted score.
//!
//! The score is total over all inputs: non-finite factors or weights count as
//! zero, and the weighted sum is clamped to [0, 1] before rounding. The score
//! is never NaN or infinite.

use serde::{Deserialize, Serialize};

use verdant_deterministic::{round_half_to_even, DEFAULT_PRECISION};

/// Magnitudes below this are treated as a zero denominator.
pub const EPSILON: f64 = 1e-6;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Caller-supplied divergence weights: yield, cost, risk, structure.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisWeights {
    pub w1: f64,
    pub w2: f64,
    pub w3: f64,
    pub w4: f64,
}

impl DisWeights {
    /// Advisory check that the weights sum to 1. The score computation does
    /// not enforce this; degenerate weights still yield a bounded score.
    pub fn is_normalized(&self) -> bool {
        let sum = self.w1 + self.w2 + self.w3 + self.w4;
        sum.is_finite() && (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }
}

impl Default for DisWeights {
    fn default() -> Self {
        Self {
            w1: 0.3,
            w2: 0.3,
            w3: 0.2,
            w4: 0.2,
        }
    }
}

/// Raw comparison values between the AI plan and the human override.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ConflictInput {
    pub ai_yield: f64,
    pub human_yield: f64,
    pub ai_cost: f64,
    pub human_cost: f64,
    /// Risk(human) - Risk(AI), already in [-1, 1].
    pub delta_risk: f64,
    pub ai_operation_count: usize,
    pub human_operation_count: usize,
}

/// The four divergence factors, each clamped to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictVector {
    pub yield_divergence: f64,
    pub cost_divergence: f64,
    pub risk_divergence: f64,
    pub structural_divergence: f64,
    /// Raised when an AI-side denominator was effectively zero and the
    /// corresponding factor was forced to 0 instead of dividing.
    pub zero_denominator_guard: bool,
}

impl ConflictVector {
    pub fn build(input: &ConflictInput) -> Self {
        let mut guard = false;
        let yield_divergence =
            relative_divergence(input.human_yield, input.ai_yield, &mut guard);
        let cost_divergence = relative_divergence(input.human_cost, input.ai_cost, &mut guard);
        let risk_divergence = sanitize(input.delta_risk.abs()).clamp(0.0, 1.0);

        let count_sum = input.ai_operation_count + input.human_operation_count;
        let count_delta = input.ai_operation_count.abs_diff(input.human_operation_count);
        let structural_divergence = count_delta as f64 / count_sum.max(1) as f64;

        Self {
            yield_divergence,
            cost_divergence,
            risk_divergence,
            structural_divergence,
            zero_denominator_guard: guard,
        }
    }
}

/// |human - ai| / |ai|, clamped to [0, 1]. An AI-side magnitude below
/// [`EPSILON`] forces the factor to 0 and raises the guard flag.
fn relative_divergence(human: f64, ai: f64, guard: &mut bool) -> f64 {
    if !ai.is_finite() || ai.abs() < EPSILON {
        *guard = true;
        return 0.0;
    }
    sanitize((human - ai).abs() / ai.abs()).clamp(0.0, 1.0)
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Weighted divergence impact score: clamp(sum of weight * factor, 0, 1),
/// banker's-rounded at the default precision.
pub fn divergence_score(vector: &ConflictVector, weights: &DisWeights) -> f64 {
    let sum = sanitize(weights.w1) * sanitize(vector.yield_divergence)
        + sanitize(weights.w2) * sanitize(vector.cost_divergence)
        + sanitize(weights.w3) * sanitize(vector.risk_divergence)
        + sanitize(weights.w4) * sanitize(vector.structural_divergence);
    let clamped = sanitize(sum).clamp(0.0, 1.0);
    // A finite value in [0, 1] always rounds cleanly.
    round_half_to_even(clamped, DEFAULT_PRECISION).unwrap_or(clamped)
}
