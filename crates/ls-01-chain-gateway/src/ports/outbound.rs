//! # Outbound Ports
//!
//! The chain RPC provider the gateway drives.

use crate::domain::{RawChainError, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use ls_types::{Address, ChainId, TxHash};
use std::sync::Arc;

/// Wallet-backed chain RPC provider - outbound port.
///
/// Errors are returned raw; the gateway classifies them.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Whether a wallet provider is reachable right now.
    async fn is_available(&self) -> bool;

    /// Accounts currently exposed, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, RawChainError>;

    /// Prompt the user for account access.
    async fn request_accounts(&self) -> Result<Vec<Address>, RawChainError>;

    /// Network the wallet is on.
    async fn chain_id(&self) -> Result<ChainId, RawChainError>;

    /// Ask the wallet to switch network.
    async fn switch_network(&self, chain_id: ChainId) -> Result<(), RawChainError>;

    /// Estimate gas for `tx` as it would execute now.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RawChainError>;

    /// Sign and broadcast `tx`.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RawChainError>;

    /// Block until `tx_hash` is mined.
    ///
    /// `Ok(None)` when the transaction was dropped or replaced.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError>;

    /// Receipt lookup without waiting.
    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError>;
}

#[async_trait]
impl<P: ChainProvider + ?Sized> ChainProvider for Arc<P> {
    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }

    async fn accounts(&self) -> Result<Vec<Address>, RawChainError> {
        (**self).accounts().await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, RawChainError> {
        (**self).request_accounts().await
    }

    async fn chain_id(&self) -> Result<ChainId, RawChainError> {
        (**self).chain_id().await
    }

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), RawChainError> {
        (**self).switch_network(chain_id).await
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, RawChainError> {
        (**self).estimate_gas(tx).await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RawChainError> {
        (**self).send_transaction(tx).await
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        (**self).wait_for_receipt(tx_hash).await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        (**self).transaction_receipt(tx_hash).await
    }
}
