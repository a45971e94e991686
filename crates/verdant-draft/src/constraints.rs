//! Propagates strategy constraints onto a draft and validates them.
//!
//! Validation collects every violation before failing, so a rejected draft
//! reports the full set of problems rather than the first one hit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::GenerationError;
use crate::types::{ConstraintOp, GeneratedDraft, StrategyConstraint};

/// One failed constraint check, carried in full on the rejection error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintViolation {
    pub kind: String,
    pub field: String,
    pub op: ConstraintOp,
    pub expected: Value,
    /// The draft-side value, absent when the draft does not carry the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub message: String,
}

/// Copies the strategy constraints onto the draft and validates each one
/// against the assembled draft. All violations are collected; any violation
/// aborts the generation.
pub fn propagate(
    draft: &mut GeneratedDraft,
    constraints: &[StrategyConstraint],
) -> Result<(), GenerationError> {
    draft.propagated_constraints = constraints.to_vec();

    let mut violations = Vec::new();
    for constraint in constraints {
        let actual = draft.field_value(&constraint.field);
        let satisfied = actual
            .as_ref()
            .is_some_and(|value| holds(constraint.op, value, &constraint.value));
        if !satisfied {
            violations.push(ConstraintViolation {
                kind: constraint.kind.clone(),
                field: constraint.field.clone(),
                op: constraint.op,
                expected: constraint.value.clone(),
                actual,
                message: constraint.message.clone(),
            });
        }
    }

    if !violations.is_empty() {
        debug!(count = violations.len(), "draft rejected by constraints");
        return Err(GenerationError::ConstraintViolations { violations });
    }
    Ok(())
}

fn holds(op: ConstraintOp, actual: &Value, expected: &Value) -> bool {
    match op {
        ConstraintOp::Eq => actual == expected,
        ConstraintOp::Lt | ConstraintOp::Gt | ConstraintOp::Lte | ConstraintOp::Gte => {
            match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(e)) => match op {
                    ConstraintOp::Lt => a < e,
                    ConstraintOp::Gt => a > e,
                    ConstraintOp::Lte => a <= e,
                    ConstraintOp::Gte => a >= e,
                    _ => unreachable!(),
                },
                _ => false,
            }
        }
        ConstraintOp::In => expected
            .as_array()
            .is_some_and(|set| set.iter().any(|candidate| candidate == actual)),
        ConstraintOp::NotIn => expected
            .as_array()
            .is_some_and(|set| set.iter().all(|candidate| candidate != actual)),
    }
}
