//! Append-only divergence ledger.
//!
//! Every entry is keyed by a deterministic idempotency key over the
//! governance-relevant subset of its evidence. Recording the same logical
//! action twice returns the first entry's identity; records are never
//! updated or deleted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use verdant_counterfactual::{ConflictVector, DisWeights, SimulationMode};
use verdant_deterministic::{canonicalize, is_stable_hash, stable_hash, CanonicalError};

use crate::error::{EvidenceProblem, LedgerError, StoreError};

/// The full evidence set persisted for one human override.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DivergenceEvidence {
    pub tenant_id: String,
    pub draft_id: String,
    pub draft_version: u32,
    /// Version of the governance configuration the weights came from.
    pub config_version: String,
    pub weights_snapshot: DisWeights,
    pub dis_score: f64,
    pub simulation_hash: String,
    pub delta_risk: f64,
    pub conflict_vector: ConflictVector,
    pub human_action: Value,
    pub explanation: String,
    pub simulation_mode: SimulationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
}

/// One immutable ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DivergenceRecord {
    pub id: Uuid,
    pub idempotency_key: String,
    pub recorded_at: DateTime<Utc>,
    pub evidence: DivergenceEvidence,
}

/// Outcome of an atomic insert: a fresh entry, or the identity of the
/// existing entry with the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(Uuid),
    Conflict(Uuid),
}

/// Storage boundary for divergence records. Insert-or-conflict must be
/// atomic with respect to the idempotency key.
pub trait DivergenceStore: Send + Sync {
    fn insert(&self, record: DivergenceRecord) -> Result<InsertOutcome, StoreError>;
    fn find_by_key(&self, key: &str) -> Result<Option<DivergenceRecord>, StoreError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<DivergenceRecord>, StoreError>;
    fn find_by_draft(&self, draft_id: &str) -> Result<Vec<DivergenceRecord>, StoreError>;
}

#[derive(Default)]
struct StoreState {
    by_id: HashMap<Uuid, DivergenceRecord>,
    by_key: HashMap<String, Uuid>,
}

/// In-memory store. The uniqueness check and the insert happen under one
/// write lock, so concurrent submitters of the same key race safely.
#[derive(Default)]
pub struct InMemoryDivergenceStore {
    inner: RwLock<StoreState>,
}

impl InMemoryDivergenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|state| state.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DivergenceStore for InMemoryDivergenceStore {
    fn insert(&self, record: DivergenceRecord) -> Result<InsertOutcome, StoreError> {
        let mut state = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(existing) = state.by_key.get(&record.idempotency_key) {
            return Ok(InsertOutcome::Conflict(*existing));
        }
        let id = record.id;
        state.by_key.insert(record.idempotency_key.clone(), id);
        state.by_id.insert(id, record);
        Ok(InsertOutcome::Created(id))
    }

    fn find_by_key(&self, key: &str) -> Result<Option<DivergenceRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<DivergenceRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn find_by_draft(&self, draft_id: &str) -> Result<Vec<DivergenceRecord>, StoreError> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut records: Vec<DivergenceRecord> = state
            .by_id
            .values()
            .filter(|record| record.evidence.draft_id == draft_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(records)
    }
}

/// Derives the idempotency key: the stable hash of the canonical form of the
/// governance-relevant evidence subset.
pub fn idempotency_key(evidence: &DivergenceEvidence) -> Result<String, CanonicalError> {
    let subset = json!({
        "draft_id": evidence.draft_id,
        "draft_version": evidence.draft_version,
        "human_action": evidence.human_action,
        "config_version": evidence.config_version,
    });
    Ok(stable_hash(&canonicalize(&subset)?))
}

/// Result of a `record` call: the entry's identity and whether this call
/// created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordReceipt {
    pub record_id: Uuid,
    pub created: bool,
}

/// Records and verifies divergence evidence over an abstract store.
pub struct DivergenceLedger {
    store: Arc<dyn DivergenceStore>,
}

impl DivergenceLedger {
    pub fn new(store: Arc<dyn DivergenceStore>) -> Self {
        Self { store }
    }

    /// Idempotent append. Identical governance-relevant evidence always maps
    /// to the same entry, including under concurrent submission.
    pub fn record(&self, evidence: DivergenceEvidence) -> Result<RecordReceipt, LedgerError> {
        validate_evidence(&evidence)?;
        let key = idempotency_key(&evidence)?;

        let record = DivergenceRecord {
            id: Uuid::new_v4(),
            idempotency_key: key.clone(),
            recorded_at: Utc::now(),
            evidence,
        };

        match self.store.insert(record)? {
            InsertOutcome::Created(id) => {
                info!(record_id = %id, key = %key, "divergence recorded");
                Ok(RecordReceipt {
                    record_id: id,
                    created: true,
                })
            }
            InsertOutcome::Conflict(existing) => {
                info!(record_id = %existing, key = %key, "idempotent replay, returning existing record");
                Ok(RecordReceipt {
                    record_id: existing,
                    created: false,
                })
            }
        }
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<DivergenceRecord>, LedgerError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Divergence history for one draft, newest first.
    pub fn find_by_draft(&self, draft_id: &str) -> Result<Vec<DivergenceRecord>, LedgerError> {
        Ok(self.store.find_by_draft(draft_id)?)
    }

    /// Re-derives the idempotency key from the stored evidence and compares
    /// it to the stored key.
    pub fn verify(&self, record: &DivergenceRecord) -> Result<bool, LedgerError> {
        Ok(idempotency_key(&record.evidence)? == record.idempotency_key)
    }
}

fn validate_evidence(evidence: &DivergenceEvidence) -> Result<(), LedgerError> {
    let mut problems = Vec::new();

    if evidence.explanation.trim().is_empty() {
        problems.push(EvidenceProblem {
            field: "explanation".into(),
            requirement: "must not be blank".into(),
            actual: format!("{:?}", evidence.explanation),
        });
    }
    if !evidence.dis_score.is_finite() || !(0.0..=1.0).contains(&evidence.dis_score) {
        problems.push(EvidenceProblem {
            field: "dis_score".into(),
            requirement: "must be within [0, 1]".into(),
            actual: evidence.dis_score.to_string(),
        });
    }
    if !evidence.delta_risk.is_finite() || !(-1.0..=1.0).contains(&evidence.delta_risk) {
        problems.push(EvidenceProblem {
            field: "delta_risk".into(),
            requirement: "must be within [-1, 1]".into(),
            actual: evidence.delta_risk.to_string(),
        });
    }
    if !is_stable_hash(&evidence.simulation_hash) {
        problems.push(EvidenceProblem {
            field: "simulation_hash".into(),
            requirement: "must be 64 lowercase hex characters".into(),
            actual: format!("len={}", evidence.simulation_hash.len()),
        });
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::InvalidEvidence { problems })
    }
}
