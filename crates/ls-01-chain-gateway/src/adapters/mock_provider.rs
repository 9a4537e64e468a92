//! Mock Chain Provider Adapter
//!
//! Scripted in-memory wallet and chain. Every step can be made to fail, and
//! counters record what the gateway asked for.

use crate::algorithms::keccak256;
use crate::domain::{RawChainError, RawLog, TransactionReceipt, TransactionRequest};
use crate::ports::ChainProvider;
use async_trait::async_trait;
use ls_types::{Address, ChainId, TxHash};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// How submitted transactions resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReceiptMode {
    /// Mined with success status.
    #[default]
    Mined,
    /// Mined with failed status.
    Reverted,
    /// Dropped from the pool; the wait returns no receipt.
    Dropped,
    /// Never resolves; the wait hangs until the caller's timeout.
    Stall,
}

#[derive(Default)]
struct MockState {
    account: Address,
    chain_id: ChainId,
    exposed: bool,
    grant_accounts: bool,
    unavailable_checks: u32,
    availability_checks: u32,
    account_requests: u32,
    account_request_error: Option<RawChainError>,
    switch_error: Option<RawChainError>,
    switch_requests: Vec<ChainId>,
    gas_estimate: u64,
    estimate_error: Option<RawChainError>,
    send_error: Option<RawChainError>,
    wait_error: Option<RawChainError>,
    next_hash: Option<TxHash>,
    receipt_mode: ReceiptMode,
    default_logs: Vec<RawLog>,
    queued_logs: VecDeque<Vec<RawLog>>,
    sent: Vec<TransactionRequest>,
    block_number: u64,
    receipts: HashMap<TxHash, TransactionReceipt>,
    pending: HashMap<TxHash, ReceiptMode>,
}

/// In-memory `ChainProvider` for tests.
pub struct MockChainProvider {
    state: Mutex<MockState>,
}

impl MockChainProvider {
    /// Available wallet exposing `account` on `chain_id`.
    pub fn new(account: Address, chain_id: ChainId) -> Self {
        Self {
            state: Mutex::new(MockState {
                account,
                chain_id,
                exposed: true,
                grant_accounts: true,
                gas_estimate: 100_000,
                block_number: 1,
                ..Default::default()
            }),
        }
    }

    /// Report unavailable for the first `checks` probes.
    pub fn unavailable_for(self, checks: u32) -> Self {
        self.state.lock().unavailable_checks = checks;
        self
    }

    /// Expose no account until access is requested.
    pub fn without_exposed_accounts(self) -> Self {
        self.state.lock().exposed = false;
        self
    }

    /// Answer access requests with an empty account list.
    pub fn grant_no_accounts(self) -> Self {
        self.state.lock().grant_accounts = false;
        self
    }

    /// Fail access requests with `error`.
    pub fn reject_account_request(self, error: RawChainError) -> Self {
        self.state.lock().account_request_error = Some(error);
        self
    }

    /// Fail network switches with `error`.
    pub fn fail_switch(self, error: RawChainError) -> Self {
        self.state.lock().switch_error = Some(error);
        self
    }

    /// Gas estimate returned for every transaction.
    pub fn with_gas_estimate(self, gas: u64) -> Self {
        self.state.lock().gas_estimate = gas;
        self
    }

    /// Fail gas estimation with `error`.
    pub fn fail_estimate(self, error: RawChainError) -> Self {
        self.state.lock().estimate_error = Some(error);
        self
    }

    /// Fail submission with `error`.
    pub fn fail_send(self, error: RawChainError) -> Self {
        self.state.lock().send_error = Some(error);
        self
    }

    /// Fail the receipt wait with `error` after broadcast.
    pub fn fail_wait(self, error: RawChainError) -> Self {
        self.state.lock().wait_error = Some(error);
        self
    }

    /// Hash for the next submitted transaction.
    pub fn with_tx_hash(self, hash: TxHash) -> Self {
        self.state.lock().next_hash = Some(hash);
        self
    }

    /// Logs attached to every mined receipt.
    pub fn with_logs(self, logs: Vec<RawLog>) -> Self {
        self.state.lock().default_logs = logs;
        self
    }

    /// How submitted transactions resolve.
    pub fn with_receipt_mode(self, mode: ReceiptMode) -> Self {
        self.set_receipt_mode(mode);
        self
    }

    /// Change how later transactions resolve.
    pub fn set_receipt_mode(&self, mode: ReceiptMode) {
        self.state.lock().receipt_mode = mode;
    }

    /// Logs for the next mined receipt only, ahead of the defaults.
    pub fn queue_logs(&self, logs: Vec<RawLog>) {
        self.state.lock().queued_logs.push_back(logs);
    }

    /// Hash for the next submitted transaction.
    pub fn set_next_hash(&self, hash: TxHash) {
        self.state.lock().next_hash = Some(hash);
    }

    /// Clear or set the submission failure.
    pub fn set_send_error(&self, error: Option<RawChainError>) {
        self.state.lock().send_error = error;
    }

    /// Switch the exposed account, as a user would in the wallet.
    pub fn set_account(&self, account: Address) {
        self.state.lock().account = account;
    }

    /// Switch network, as a user would in the wallet.
    pub fn set_chain(&self, chain_id: ChainId) {
        self.state.lock().chain_id = chain_id;
    }

    /// Store a receipt visible to lookups.
    pub fn insert_receipt(&self, receipt: TransactionReceipt) {
        let mut state = self.state.lock();
        state.pending.remove(&receipt.tx_hash);
        state.receipts.insert(receipt.tx_hash, receipt);
    }

    /// Transactions broadcast so far.
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    /// Wallet availability probes so far.
    pub fn availability_checks(&self) -> u32 {
        self.state.lock().availability_checks
    }

    /// Account access prompts so far.
    pub fn account_requests(&self) -> u32 {
        self.state.lock().account_requests
    }

    /// Networks the wallet was asked to switch to.
    pub fn switch_requests(&self) -> Vec<ChainId> {
        self.state.lock().switch_requests.clone()
    }
}

impl MockState {
    fn mint_hash(&mut self) -> TxHash {
        if let Some(hash) = self.next_hash.take() {
            return hash;
        }
        let seed = format!("mock-tx-{}", self.sent.len());
        keccak256(seed.as_bytes())
    }

    fn mine(&mut self, hash: TxHash, status: bool) -> TransactionReceipt {
        let logs = if status {
            self.queued_logs
                .pop_front()
                .unwrap_or_else(|| self.default_logs.clone())
        } else {
            Vec::new()
        };
        self.block_number += 1;
        let receipt = TransactionReceipt {
            tx_hash: hash,
            block_number: self.block_number,
            status,
            gas_used: self.gas_estimate,
            logs,
        };
        self.receipts.insert(hash, receipt.clone());
        receipt
    }
}

#[async_trait]
impl ChainProvider for MockChainProvider {
    async fn is_available(&self) -> bool {
        let mut state = self.state.lock();
        state.availability_checks += 1;
        if state.unavailable_checks > 0 {
            state.unavailable_checks -= 1;
            return false;
        }
        true
    }

    async fn accounts(&self) -> Result<Vec<Address>, RawChainError> {
        let state = self.state.lock();
        Ok(if state.exposed {
            vec![state.account]
        } else {
            Vec::new()
        })
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, RawChainError> {
        let mut state = self.state.lock();
        state.account_requests += 1;
        if let Some(error) = state.account_request_error.clone() {
            return Err(error);
        }
        if !state.grant_accounts {
            return Ok(Vec::new());
        }
        state.exposed = true;
        Ok(vec![state.account])
    }

    async fn chain_id(&self) -> Result<ChainId, RawChainError> {
        Ok(self.state.lock().chain_id)
    }

    async fn switch_network(&self, chain_id: ChainId) -> Result<(), RawChainError> {
        let mut state = self.state.lock();
        state.switch_requests.push(chain_id);
        if let Some(error) = state.switch_error.clone() {
            return Err(error);
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, RawChainError> {
        let state = self.state.lock();
        match &state.estimate_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.gas_estimate),
        }
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, RawChainError> {
        let mut state = self.state.lock();
        if let Some(error) = state.send_error.clone() {
            return Err(error);
        }
        let hash = state.mint_hash();
        state.sent.push(tx.clone());
        let mode = state.receipt_mode;
        state.pending.insert(hash, mode);
        Ok(hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        {
            let mut state = self.state.lock();
            if let Some(error) = state.wait_error.clone() {
                return Err(error);
            }
            if let Some(receipt) = state.receipts.get(&tx_hash) {
                return Ok(Some(receipt.clone()));
            }
            match state.pending.get(&tx_hash).copied() {
                Some(ReceiptMode::Mined) => {
                    state.pending.remove(&tx_hash);
                    return Ok(Some(state.mine(tx_hash, true)));
                }
                Some(ReceiptMode::Reverted) => {
                    state.pending.remove(&tx_hash);
                    return Ok(Some(state.mine(tx_hash, false)));
                }
                Some(ReceiptMode::Stall) => {}
                Some(ReceiptMode::Dropped) | None => return Ok(None),
            }
        }
        std::future::pending::<()>().await;
        Ok(None)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RawChainError> {
        Ok(self.state.lock().receipts.get(&tx_hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransactionRequest {
        TransactionRequest {
            from: Address::repeat_byte(1),
            to: Address::repeat_byte(2),
            data: vec![1, 2, 3],
            value: None,
            gas: Some(120_000),
        }
    }

    #[tokio::test]
    async fn test_mined_receipt_is_visible_to_lookup() {
        let provider = MockChainProvider::new(Address::repeat_byte(1), ChainId(1));
        let hash = provider.send_transaction(&request()).await.unwrap();
        assert!(provider.transaction_receipt(hash).await.unwrap().is_none());
        let receipt = provider.wait_for_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.status);
        assert_eq!(
            provider.transaction_receipt(hash).await.unwrap(),
            Some(receipt)
        );
    }

    #[tokio::test]
    async fn test_queued_logs_take_precedence() {
        let log = RawLog {
            address: Address::repeat_byte(2),
            topics: vec![],
            data: vec![9],
        };
        let provider = MockChainProvider::new(Address::repeat_byte(1), ChainId(1));
        provider.queue_logs(vec![log.clone()]);
        let first = provider.send_transaction(&request()).await.unwrap();
        let second = provider.send_transaction(&request()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(
            provider.wait_for_receipt(first).await.unwrap().unwrap().logs,
            vec![log]
        );
        assert!(provider
            .wait_for_receipt(second)
            .await
            .unwrap()
            .unwrap()
            .logs
            .is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_has_no_receipt() {
        let provider = MockChainProvider::new(Address::repeat_byte(1), ChainId(1))
            .with_receipt_mode(ReceiptMode::Dropped);
        let hash = provider.send_transaction(&request()).await.unwrap();
        assert!(provider.wait_for_receipt(hash).await.unwrap().is_none());
    }
}
