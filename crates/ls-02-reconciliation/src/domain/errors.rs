//! # Reconciliation Errors
//!
//! Three outcome classes matter to callers:
//!
//! - **Nothing happened**: `InvalidTransition`, `InvalidOperation`, `Wallet`, `OnChain` (except
//!   `Unconfirmed`), `Store`. Safe to retry from scratch.
//! - **Chain mutated, identifier unknown**: `EventNotFound`. Carries the
//!   transaction hash for reconciliation against the chain.
//! - **Chain mutated, identifier known**: `OffChainWriteFailed`. Carries the
//!   full chain fact; retry the mirror write alone.

use super::operation::ChainFact;
use ls_01_chain_gateway::{DomainErrorKind, GatewayError, OperationKind};
use ls_types::{hash_hex, BorrowingStatus, TxHash};
use thiserror::Error;

/// A status append that breaks the canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition to {got}: expected {}", expected_text(.expected))]
pub struct InvalidTransition {
    /// Next legal status, `None` when terminal
    pub expected: Option<BorrowingStatus>,
    /// Status that was attempted
    pub got: BorrowingStatus,
}

fn expected_text(expected: &Option<BorrowingStatus>) -> String {
    match expected {
        Some(status) => status.to_string(),
        None => "no further status (log is terminal)".to_string(),
    }
}

/// Off-chain store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Record failed validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Storage backend unavailable or failing
    #[error("backend error: {0}")]
    Backend(String),
}

/// Coordinator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// Rejected before either store was touched
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The operation cannot be encoded as a contract call
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// No usable wallet session
    #[error("wallet: {0}")]
    Wallet(DomainErrorKind),

    /// The on-chain call failed; no mirror write was attempted
    #[error("on-chain call failed: {0}")]
    OnChain(GatewayError),

    /// Confirmed, but no expected event could be decoded
    #[error("{operation} confirmed in {} but its event was not found", hash_hex(.tx_hash))]
    EventNotFound {
        /// Confirmed transaction
        tx_hash: TxHash,
        /// Operation that was submitted
        operation: OperationKind,
    },

    /// Confirmed and decoded, but the mirror write failed
    #[error("mirror write for {fact} failed: {source}")]
    OffChainWriteFailed {
        /// Everything needed to retry the mirror write
        fact: ChainFact,
        /// Store failure
        source: StoreError,
    },

    /// A store read needed before submission failed
    #[error("store: {0}")]
    Store(StoreError),

    /// A retry was given a fact that does not belong to the operation
    #[error("fact {fact} does not belong to {operation}")]
    MismatchedFact {
        /// Retried operation
        operation: OperationKind,
        /// Supplied fact
        fact: ChainFact,
    },
}

impl ReconciliationError {
    /// Stable discriminant for logs, metrics and transport framing.
    pub fn label(&self) -> &'static str {
        match self {
            ReconciliationError::InvalidTransition(_) => "invalid_transition",
            ReconciliationError::InvalidOperation(_) => "invalid_operation",
            ReconciliationError::Wallet(kind) => kind.label(),
            ReconciliationError::OnChain(e) => e.label(),
            ReconciliationError::EventNotFound { .. } => "event_not_found",
            ReconciliationError::OffChainWriteFailed { .. } => "off_chain_write_failed",
            ReconciliationError::Store(_) => "store",
            ReconciliationError::MismatchedFact { .. } => "mismatched_fact",
        }
    }

    /// Hash of a transaction that may have changed chain state.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ReconciliationError::OnChain(e) => e.tx_hash(),
            ReconciliationError::EventNotFound { tx_hash, .. } => Some(*tx_hash),
            ReconciliationError::OffChainWriteFailed { fact, .. } => Some(fact.tx_hash),
            _ => None,
        }
    }

    /// Whether the chain may hold an effect the mirror lacks.
    pub fn needs_reconciliation(&self) -> bool {
        matches!(
            self,
            ReconciliationError::EventNotFound { .. }
                | ReconciliationError::OffChainWriteFailed { .. }
                | ReconciliationError::OnChain(GatewayError::Unconfirmed { .. })
        )
    }
}
