//! Structured explanation of a conflict analysis.
//!
//! The breakdown contract is the deliverable here; prose generation beyond
//! these fixed templates belongs to the presentation layer. The summary is
//! non-empty by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{ConflictVector, DisWeights};
use crate::engine::SimulationMode;

/// Final advice derived from the divergence and risk scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

/// One divergence factor with its weighted contribution to the score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: String,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConflictBreakdown {
    pub summary: String,
    pub risk_note: String,
    pub factors: Vec<FactorContribution>,
    pub recommendation: Recommendation,
    pub recommendation_reason: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct ExplainInput {
    pub dis_score: f64,
    pub delta_risk: f64,
    pub vector: ConflictVector,
    pub weights: DisWeights,
    pub regret: f64,
    pub mode: SimulationMode,
    pub is_system_fallback: bool,
}

/// Builds the factor breakdown, recommendation, and summary for one analysis.
pub fn build_breakdown(input: &ExplainInput) -> ConflictBreakdown {
    let recommendation = derive_recommendation(input);
    ConflictBreakdown {
        summary: build_summary(input, recommendation),
        risk_note: build_risk_note(input),
        factors: build_factors(input),
        recommendation,
        recommendation_reason: build_reason(input, recommendation),
        generated_at: Utc::now(),
    }
}

fn derive_recommendation(input: &ExplainInput) -> Recommendation {
    if input.is_system_fallback {
        return Recommendation::Review;
    }
    if input.dis_score > 0.8 && input.delta_risk > 0.5 {
        return Recommendation::Reject;
    }
    if input.dis_score > 0.5 || input.delta_risk > 0.3 {
        return Recommendation::Review;
    }
    Recommendation::Accept
}

fn build_summary(input: &ExplainInput, recommendation: Recommendation) -> String {
    let direction = if input.delta_risk > 0.0 {
        "raises"
    } else if input.delta_risk < 0.0 {
        "lowers"
    } else {
        "does not change"
    };
    let level = if input.dis_score > 0.7 {
        "high"
    } else if input.dis_score > 0.3 {
        "moderate"
    } else {
        "low"
    };
    format!(
        "The human override {direction} risk by {:.1}%. Divergence from the AI plan is {level} (DIS={:.4}). Recommendation: {recommendation:?}. Simulation mode: {}.",
        (input.delta_risk * 100.0).abs(),
        input.dis_score,
        input.mode,
    )
}

fn build_risk_note(input: &ExplainInput) -> String {
    if input.is_system_fallback {
        return "Analysis ran in system fallback mode; results are conservative placeholders and a manual review is required.".to_string();
    }
    if input.delta_risk > 0.5 {
        format!(
            "Critical risk increase: dRisk={:.4}. The override raises risk substantially; reconsideration is strongly advised.",
            input.delta_risk
        )
    } else if input.delta_risk > 0.2 {
        format!(
            "Elevated risk: dRisk={:.4}. The override moderately raises risk; an expert check is advised.",
            input.delta_risk
        )
    } else if input.delta_risk < -0.2 {
        format!(
            "Favorable deviation: dRisk={:.4}. The override lowers risk relative to the AI plan.",
            input.delta_risk
        )
    } else {
        format!(
            "Within normal bounds: dRisk={:.4}.",
            input.delta_risk
        )
    }
}

fn build_factors(input: &ExplainInput) -> Vec<FactorContribution> {
    let entries = [
        ("yield", input.vector.yield_divergence, input.weights.w1),
        ("cost", input.vector.cost_divergence, input.weights.w2),
        ("risk", input.vector.risk_divergence, input.weights.w3),
        ("structure", input.vector.structural_divergence, input.weights.w4),
    ];
    entries
        .into_iter()
        .map(|(factor, value, weight)| FactorContribution {
            factor: factor.to_string(),
            value,
            weight,
            contribution: value * weight,
            detail: describe_deviation(value, factor),
        })
        .collect()
}

fn describe_deviation(value: f64, factor: &str) -> String {
    let degree = if value < 0.1 {
        "minimal"
    } else if value < 0.3 {
        "moderate"
    } else if value < 0.6 {
        "significant"
    } else {
        "critical"
    };
    format!("{degree} {factor} deviation")
}

fn build_reason(input: &ExplainInput, recommendation: Recommendation) -> String {
    match recommendation {
        Recommendation::Accept => {
            "The override does not diverge significantly from the AI plan; no extra review is needed.".to_string()
        }
        Recommendation::Review => format!(
            "DIS={:.4}, dRisk={:.4}. Expert review is advised before confirmation.",
            input.dis_score, input.delta_risk
        ),
        Recommendation::Reject => format!(
            "High risk: DIS={:.4}, dRisk={:.4}, regret={:.2}. Rejecting this override is strongly advised.",
            input.dis_score, input.delta_risk, input.regret
        ),
    }
}
