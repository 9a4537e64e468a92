//! # Contract Gateway
//!
//! Builds, gas-estimates, submits and awaits a single contract call.
//!
//! ## Call Steps
//!
//! 1. Re-validate the wallet session against the provider.
//! 2. Estimate gas for the exact calldata.
//! 3. Submit with the estimate scaled by the configured buffer.
//! 4. Wait for the receipt, bounded by the confirmation timeout.
//!
//! Faults before broadcast are classified and returned as
//! [`GatewayError::Rejected`]. Once a hash exists, any failure to observe a
//! successful receipt is [`GatewayError::Unconfirmed`] or
//! [`GatewayError::Reverted`]. A broadcast transaction is never resubmitted.

use super::wallet::WalletConnector;
use crate::algorithms::{buffered_gas_limit, classify};
use crate::domain::{
    CallStage, ContractBinding, DomainErrorKind, GatewayConfig, GatewayError, TransactionIntent,
    TransactionOutcome, TransactionRequest,
};
use crate::ports::{ChainGatewayApi, ChainProvider};
use async_trait::async_trait;
use ls_telemetry::metrics::{observe_gas_limit, record_gateway_call};
use ls_types::{hash_hex, TxHash, WalletSession};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Contract gateway over a chain provider.
pub struct ContractGateway<P: ChainProvider> {
    provider: Arc<P>,
    wallet: WalletConnector<P>,
    config: GatewayConfig,
    contract: ContractBinding,
}

impl<P: ChainProvider> ContractGateway<P> {
    /// Gateway for the contract and network in `config`.
    pub fn new(provider: Arc<P>, config: GatewayConfig) -> Self {
        let wallet = WalletConnector::new(provider.clone(), &config);
        let contract = config.contract();
        Self {
            provider,
            wallet,
            config,
            contract,
        }
    }

    /// Underlying provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Active configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn submit(
        &self,
        session: &WalletSession,
        intent: &TransactionIntent,
    ) -> Result<TransactionOutcome, GatewayError> {
        self.wallet
            .revalidate(session)
            .await
            .map_err(|kind| rejected(CallStage::Session, kind))?;

        if intent.contract.address != self.contract.address {
            return Err(rejected(
                CallStage::Session,
                DomainErrorKind::Unknown {
                    message: format!("intent targets unexpected contract {}", intent.contract.name),
                },
            ));
        }

        let mut request = TransactionRequest {
            from: session.address,
            to: intent.contract.address,
            data: intent.calldata(),
            value: intent.value,
            gas: None,
        };

        let estimate = self
            .provider
            .estimate_gas(&request)
            .await
            .map_err(|e| rejected(CallStage::EstimateGas, classify(&e)))?;
        let gas_limit = buffered_gas_limit(estimate, self.config.gas_buffer_percent);
        observe_gas_limit(gas_limit);
        debug!(estimate, gas_limit, "Gas estimated");
        request.gas = Some(gas_limit);

        let tx_hash = self
            .provider
            .send_transaction(&request)
            .await
            .map_err(|e| rejected(CallStage::Submit, classify(&e)))?;
        info!(tx_hash = %hash_hex(&tx_hash), gas_limit, "Transaction broadcast");

        self.await_receipt(tx_hash).await
    }

    async fn await_receipt(&self, tx_hash: TxHash) -> Result<TransactionOutcome, GatewayError> {
        let waited = tokio::time::timeout(
            self.config.confirmation_timeout(),
            self.provider.wait_for_receipt(tx_hash),
        )
        .await;

        let receipt = match waited {
            Ok(Ok(Some(receipt))) => receipt,
            Ok(Ok(None)) => {
                warn!(tx_hash = %hash_hex(&tx_hash), "Transaction dropped or replaced");
                return Err(GatewayError::Unconfirmed { tx_hash });
            }
            Ok(Err(e)) => {
                warn!(tx_hash = %hash_hex(&tx_hash), error = %e, "Receipt wait failed");
                return Err(GatewayError::Unconfirmed { tx_hash });
            }
            Err(_) => {
                warn!(
                    tx_hash = %hash_hex(&tx_hash),
                    timeout_ms = self.config.confirmation_timeout_ms,
                    "Receipt wait timed out"
                );
                return Err(GatewayError::Unconfirmed { tx_hash });
            }
        };

        if !receipt.status {
            return Err(GatewayError::Reverted { tx_hash });
        }
        Ok(TransactionOutcome::confirmed(receipt))
    }
}

fn rejected(stage: CallStage, kind: DomainErrorKind) -> GatewayError {
    GatewayError::Rejected { stage, kind }
}

#[async_trait]
impl<P: ChainProvider> ChainGatewayApi for ContractGateway<P> {
    async fn acquire_session(&self) -> Result<WalletSession, DomainErrorKind> {
        self.wallet.acquire().await
    }

    async fn call(
        &self,
        session: &WalletSession,
        intent: &TransactionIntent,
    ) -> Result<TransactionOutcome, GatewayError> {
        let operation = intent.operation();
        let result = self.submit(session, intent).await;
        match &result {
            Ok(outcome) => {
                record_gateway_call(operation.as_str(), "confirmed");
                info!(
                    operation = %operation,
                    tx_hash = %hash_hex(&outcome.hash),
                    block = ?outcome.block_number,
                    "Contract call confirmed"
                );
            }
            Err(e) => {
                record_gateway_call(operation.as_str(), e.label());
                warn!(operation = %operation, error = %e, "Contract call failed");
            }
        }
        result
    }

    async fn fetch_outcome(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionOutcome>, GatewayError> {
        let receipt = self
            .provider
            .transaction_receipt(tx_hash)
            .await
            .map_err(|e| rejected(CallStage::Receipt, classify(&e)))?;
        match receipt {
            None => Ok(None),
            Some(r) if !r.status => Err(GatewayError::Reverted { tx_hash }),
            Some(r) => Ok(Some(TransactionOutcome::confirmed(r))),
        }
    }

    fn contract(&self) -> &ContractBinding {
        &self.contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockChainProvider, ReceiptMode};
    use crate::domain::{ContractCall, RawChainError};
    use ls_types::{Address, ChainId};

    const CHAIN: ChainId = ChainId(31_337);

    fn account() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn config() -> GatewayConfig {
        GatewayConfig {
            required_chain_id: CHAIN,
            contract_address: Address::repeat_byte(0xcc),
            wallet_poll_interval_ms: 1,
            confirmation_timeout_ms: 50,
            ..Default::default()
        }
    }

    fn gateway(provider: MockChainProvider) -> ContractGateway<MockChainProvider> {
        ContractGateway::new(Arc::new(provider), config())
    }

    fn intent(gateway: &ContractGateway<MockChainProvider>) -> TransactionIntent {
        TransactionIntent::new(
            gateway.contract().clone(),
            ContractCall::RegisterCurator {
                name: "Acme Library".to_string(),
                metadata_uri: "ipfs://acme".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_call_confirms_with_buffered_gas() {
        let gateway = gateway(MockChainProvider::new(account(), CHAIN).with_gas_estimate(50_000));
        let session = gateway.acquire_session().await.unwrap();
        let outcome = gateway.call(&session, &intent(&gateway)).await.unwrap();

        assert!(outcome.block_confirmed);
        let sent = gateway.provider().sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].gas, Some(60_000));
        assert_eq!(sent[0].from, account());
        assert_eq!(sent[0].to, gateway.contract().address);
    }

    #[tokio::test]
    async fn test_stale_session_is_rejected_before_estimate() {
        let gateway = gateway(MockChainProvider::new(account(), CHAIN));
        let session = gateway.acquire_session().await.unwrap();
        gateway.provider().set_chain(ChainId(1));

        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                stage: CallStage::Session,
                kind: DomainErrorKind::WrongNetwork,
            }
        );
        assert!(gateway.provider().sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_estimate_failure_is_classified() {
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN).fail_estimate(RawChainError::with_code(
                -32000,
                "insufficient funds for gas * price + value",
            )),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(err.kind(), Some(&DomainErrorKind::InsufficientFunds));
        assert!(gateway.provider().sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejection_is_classified() {
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN)
                .fail_send(RawChainError::new("user denied transaction signature").symbol("ACTION_REJECTED")),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                stage: CallStage::Submit,
                kind: DomainErrorKind::UserRejected,
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_transaction_is_unconfirmed() {
        let hash = TxHash::from_low_u64_be(0xdead);
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN)
                .with_tx_hash(hash)
                .with_receipt_mode(ReceiptMode::Dropped),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(err, GatewayError::Unconfirmed { tx_hash: hash });
        assert_eq!(gateway.provider().sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_wait_times_out_as_unconfirmed() {
        let hash = TxHash::from_low_u64_be(0xbeef);
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN)
                .with_tx_hash(hash)
                .with_receipt_mode(ReceiptMode::Stall),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(err, GatewayError::Unconfirmed { tx_hash: hash });
    }

    #[tokio::test]
    async fn test_wait_error_keeps_hash() {
        let hash = TxHash::from_low_u64_be(0xf00d);
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN)
                .with_tx_hash(hash)
                .fail_wait(RawChainError::new("connection reset")),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(err.tx_hash(), Some(hash));
    }

    #[tokio::test]
    async fn test_reverted_receipt() {
        let hash = TxHash::from_low_u64_be(0xbad);
        let gateway = gateway(
            MockChainProvider::new(account(), CHAIN)
                .with_tx_hash(hash)
                .with_receipt_mode(ReceiptMode::Reverted),
        );
        let session = gateway.acquire_session().await.unwrap();
        let err = gateway.call(&session, &intent(&gateway)).await.unwrap_err();
        assert_eq!(err, GatewayError::Reverted { tx_hash: hash });
    }

    #[tokio::test]
    async fn test_rejects_foreign_contract() {
        let gateway = gateway(MockChainProvider::new(account(), CHAIN));
        let session = gateway.acquire_session().await.unwrap();
        let mut intent = intent(&gateway);
        intent.contract = ContractBinding::new("other", Address::repeat_byte(0xee));
        assert!(gateway.call(&session, &intent).await.is_err());
        assert!(gateway.provider().sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_outcome() {
        let gateway = gateway(MockChainProvider::new(account(), CHAIN));
        let session = gateway.acquire_session().await.unwrap();
        let outcome = gateway.call(&session, &intent(&gateway)).await.unwrap();

        let fetched = gateway.fetch_outcome(outcome.hash).await.unwrap();
        assert_eq!(fetched, Some(outcome));
        assert_eq!(
            gateway
                .fetch_outcome(TxHash::from_low_u64_be(404))
                .await
                .unwrap(),
            None
        );
    }
}
