//! # Inbound Ports
//!
//! API the reconciliation layer consumes.

use crate::domain::{
    ContractBinding, DomainErrorKind, GatewayError, TransactionIntent, TransactionOutcome,
};
use async_trait::async_trait;
use ls_types::{TxHash, WalletSession};

/// Chain gateway API - inbound port.
#[async_trait]
pub trait ChainGatewayApi: Send + Sync {
    /// Acquire a connected session on the required network.
    ///
    /// May suspend indefinitely on a wallet prompt. Callers own the timeout.
    async fn acquire_session(&self) -> Result<WalletSession, DomainErrorKind>;

    /// Estimate, submit and await one call.
    ///
    /// Never retries: a broadcast transaction that fails to confirm is
    /// reported as [`GatewayError::Unconfirmed`] with its hash.
    async fn call(
        &self,
        session: &WalletSession,
        intent: &TransactionIntent,
    ) -> Result<TransactionOutcome, GatewayError>;

    /// Look up the outcome of an earlier transaction without waiting.
    ///
    /// `Ok(None)` while the transaction is unknown or pending.
    async fn fetch_outcome(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionOutcome>, GatewayError>;

    /// Contract this gateway is bound to.
    fn contract(&self) -> &ContractBinding;
}
