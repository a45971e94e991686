use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input parameters for one draft generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationParams {
    pub strategy_id: String,
    pub strategy_version: u32,
    pub crop_id: String,
    pub season_id: String,
    pub field_id: String,
    pub tenant_id: String,
    pub harvest_plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precursor: Option<String>,
    /// Explicit seed as a base-10 uint32 string. Validated, never trusted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_seed: Option<String>,
}

/// An operation template taken from the selected strategy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperationTemplate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sequence: u32,
    pub stage_name: String,
    pub stage_sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_machinery_type: Option<String>,
    pub resources: Vec<ResourceTemplate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub kind: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
}

/// Comparison operators supported by strategy constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOp {
    Eq,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    NotIn,
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConstraintOp::Eq => "eq",
            ConstraintOp::Lt => "lt",
            ConstraintOp::Gt => "gt",
            ConstraintOp::Lte => "lte",
            ConstraintOp::Gte => "gte",
            ConstraintOp::In => "in",
            ConstraintOp::NotIn => "not_in",
        };
        f.write_str(text)
    }
}

/// A constraint declared by the strategy and propagated onto the draft.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyConstraint {
    /// Constraint family, e.g. "timing", "resource", "soil", "moisture".
    pub kind: String,
    /// Draft field the constraint applies to.
    pub field: String,
    pub op: ConstraintOp,
    pub value: Value,
    pub message: String,
}

/// Workflow states a plan draft can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    GeneratedDraft,
    Draft,
    OverrideAnalysis,
    Archived,
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DraftState::GeneratedDraft => "generated_draft",
            DraftState::Draft => "draft",
            DraftState::OverrideAnalysis => "override_analysis",
            DraftState::Archived => "archived",
        };
        f.write_str(text)
    }
}

/// The role an actor holds when driving a transition. Automated actors can
/// never approve governance-relevant transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Executive,
    Manager,
    Agronomist,
    System,
    AiAgent,
}

impl ActorRole {
    pub fn is_human(&self) -> bool {
        !matches!(self, ActorRole::System | ActorRole::AiAgent)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ActorRole::Admin => "admin",
            ActorRole::Executive => "executive",
            ActorRole::Manager => "manager",
            ActorRole::Agronomist => "agronomist",
            ActorRole::System => "system",
            ActorRole::AiAgent => "ai_agent",
        };
        f.write_str(text)
    }
}

/// Provenance of one generation run. Immutable, embedded in the draft.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub model_id: String,
    pub model_version: String,
    /// Derived from the seed, never from the wall clock.
    pub generated_at: DateTime<Utc>,
    /// Decimal uint32 string.
    pub seed: String,
    /// Generation hash over canonical payload + model version + seed.
    pub hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedResource {
    pub kind: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedOperation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_machinery_type: Option<String>,
    pub resources: Vec<GeneratedResource>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedStage {
    pub name: String,
    pub sequence: u32,
    pub operations: Vec<GeneratedOperation>,
}

/// A generated plan draft. Created whole by the pipeline or not at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedDraft {
    pub season_id: String,
    pub harvest_plan_id: String,
    pub tenant_id: String,
    pub field_id: String,
    pub crop: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moisture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precursor: Option<String>,
    pub state: DraftState,
    pub version: u32,
    pub metadata: GenerationMetadata,
    pub stages: Vec<GeneratedStage>,
    pub propagated_constraints: Vec<StrategyConstraint>,
}

impl GeneratedDraft {
    pub fn operation_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.operations.len()).sum()
    }

    /// Resolves a constraint field name against the assembled draft.
    /// Returns `None` for fields this draft does not expose.
    pub fn field_value(&self, field: &str) -> Option<Value> {
        match field {
            "crop" => Some(Value::String(self.crop.clone())),
            "season_id" => Some(Value::String(self.season_id.clone())),
            "field_id" => Some(Value::String(self.field_id.clone())),
            "soil_type" => self.soil_type.clone().map(Value::String),
            "precursor" => self.precursor.clone().map(Value::String),
            "moisture" => self
                .moisture
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            "version" => Some(Value::Number(self.version.into())),
            "stage_count" => Some(Value::Number((self.stages.len() as u64).into())),
            "operation_count" => Some(Value::Number((self.operation_count() as u64).into())),
            _ => None,
        }
    }
}
