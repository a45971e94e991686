//! Draft state machine with evidentiary guards.
//!
//! The transition matrix is data: an explicit whitelist of edges, each
//! declaring what evidence it needs. Anything not listed is forbidden.

use serde::{Deserialize, Serialize};
use tracing::debug;

use verdant_draft::{ActorRole, DraftState};

use crate::error::GovernanceError;

/// Divergence score above which a transition needs a written justification.
/// The boundary is exclusive: exactly this value passes without one.
pub const HIGH_RISK_DIS_THRESHOLD: f64 = 0.7;

/// Evidence supplied by the caller at transition time. Never persisted here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GovernanceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divergence_record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dis_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

struct TransitionRule {
    from: DraftState,
    to: DraftState,
    requires_human: bool,
    requires_divergence_record: bool,
    requires_justification: bool,
}

const TRANSITION_MATRIX: [TransitionRule; 5] = [
    TransitionRule {
        from: DraftState::GeneratedDraft,
        to: DraftState::Draft,
        requires_human: true,
        requires_divergence_record: false,
        requires_justification: false,
    },
    TransitionRule {
        from: DraftState::GeneratedDraft,
        to: DraftState::Archived,
        requires_human: true,
        requires_divergence_record: false,
        requires_justification: false,
    },
    TransitionRule {
        from: DraftState::Draft,
        to: DraftState::OverrideAnalysis,
        requires_human: true,
        requires_divergence_record: false,
        requires_justification: false,
    },
    TransitionRule {
        from: DraftState::OverrideAnalysis,
        to: DraftState::Draft,
        requires_human: true,
        requires_divergence_record: true,
        requires_justification: true,
    },
    TransitionRule {
        from: DraftState::OverrideAnalysis,
        to: DraftState::Archived,
        requires_human: true,
        requires_divergence_record: false,
        requires_justification: false,
    },
];

/// Validates draft workflow transitions against the matrix.
#[derive(Clone, Copy, Debug, Default)]
pub struct DraftStateMachine;

impl DraftStateMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn can_transition(
        &self,
        from: DraftState,
        to: DraftState,
        role: ActorRole,
        governance: Option<&GovernanceContext>,
    ) -> bool {
        self.validate(from, to, role, governance).is_ok()
    }

    /// Checks the transition and names the exact precondition that failed.
    /// Transitions without governance requirements ignore any supplied
    /// context entirely.
    pub fn validate(
        &self,
        from: DraftState,
        to: DraftState,
        role: ActorRole,
        governance: Option<&GovernanceContext>,
    ) -> Result<(), GovernanceError> {
        let rule = TRANSITION_MATRIX
            .iter()
            .find(|rule| rule.from == from && rule.to == to)
            .ok_or_else(|| GovernanceError::UnknownTransition {
                from,
                to,
                allowed: TRANSITION_MATRIX
                    .iter()
                    .filter(|rule| rule.from == from)
                    .map(|rule| rule.to)
                    .collect(),
            })?;

        if rule.requires_human && !role.is_human() {
            return Err(GovernanceError::HumanRequired { from, to, role });
        }

        if rule.requires_divergence_record {
            let has_record = governance
                .and_then(|ctx| ctx.divergence_record_id.as_deref())
                .is_some_and(|id| !id.trim().is_empty());
            if !has_record {
                return Err(GovernanceError::DivergenceRecordRequired { from, to });
            }
        }

        if rule.requires_justification {
            if let Some(dis_score) = governance.and_then(|ctx| ctx.dis_score) {
                if dis_score > HIGH_RISK_DIS_THRESHOLD {
                    let justified = governance
                        .and_then(|ctx| ctx.justification.as_deref())
                        .is_some_and(|text| !text.trim().is_empty());
                    if !justified {
                        return Err(GovernanceError::JustificationRequired { dis_score });
                    }
                }
            }
        }

        debug!(%from, %to, %role, "transition admitted");
        Ok(())
    }

    /// Target states reachable from `from` for the given role.
    pub fn available_transitions(&self, from: DraftState, role: ActorRole) -> Vec<DraftState> {
        TRANSITION_MATRIX
            .iter()
            .filter(|rule| rule.from == from)
            .filter(|rule| !rule.requires_human || role.is_human())
            .map(|rule| rule.to)
            .collect()
    }
}
