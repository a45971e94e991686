//! # verdant-governance
//!
//! The evidentiary layer over draft generation and override analysis: a
//! declarative state machine that only admits transitions backed by the
//! required evidence, and an append-only divergence ledger whose entries are
//! idempotent by a deterministic key.
//!
//! Governance never decides *who* may act beyond the human/automated split;
//! it decides whether the *evidence* for a transition exists.

#![deny(unsafe_code)]

pub mod error;
pub mod fsm;
pub mod ledger;

pub use error::{EvidenceProblem, GovernanceError, LedgerError, StoreError};
pub use fsm::{DraftStateMachine, GovernanceContext, HIGH_RISK_DIS_THRESHOLD};
pub use ledger::{
    idempotency_key, DivergenceEvidence, DivergenceLedger, DivergenceRecord, DivergenceStore,
    InMemoryDivergenceStore, InsertOutcome, RecordReceipt,
};
