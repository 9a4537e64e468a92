//! # Inbound Ports
//!
//! API offered to the application and notification layers.

use crate::domain::{ChainFact, DomainOperation, ReconciledWrite, ReconciliationError};
use async_trait::async_trait;

/// Reconciliation API - inbound port.
///
/// The returned triple and [`ReconciliationError`] are the whole contract;
/// transport framing is left to the caller.
#[async_trait]
pub trait ReconciliationApi: Send + Sync {
    /// Run `op` against the chain, then mirror it off-chain.
    async fn execute(&self, op: DomainOperation) -> Result<ReconciledWrite, ReconciliationError>;

    /// Repeat only the mirror write for a chain fact that is already durable.
    async fn retry_off_chain(
        &self,
        op: &DomainOperation,
        fact: &ChainFact,
    ) -> Result<ReconciledWrite, ReconciliationError>;
}
