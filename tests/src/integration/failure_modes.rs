//! Partial failures: what each store holds afterwards and how the caller
//! gets back to a consistent state.

use super::fixtures::*;
use ls_01_chain_gateway::{
    CallStage, DomainErrorKind, GatewayError, MockChainProvider, RawChainError, ReceiptMode,
    TransactionReceipt,
};
use ls_02_reconciliation::{
    ChainFact, IncidentJournal, IncidentKind, MirrorStore, ProtocolId, ReconciliationApi,
    ReconciliationError, StoreError,
};
use ls_types::{record_id, BorrowingStatus, ChainId, RecordKind, TxHash, U256};

fn mined(tx_hash: TxHash, logs: Vec<ls_01_chain_gateway::RawLog>) -> TransactionReceipt {
    TransactionReceipt {
        tx_hash,
        block_number: 12,
        status: true,
        gas_used: 90_000,
        logs,
    }
}

#[tokio::test]
async fn test_submit_failure_leaves_both_stores_untouched() {
    let provider = MockChainProvider::new(account(), CHAIN).fail_send(
        RawChainError::with_code(-32000, "insufficient funds for gas * price + value")
            .symbol("INSUFFICIENT_FUNDS"),
    );
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReconciliationError::OnChain(GatewayError::Rejected {
            stage: CallStage::Submit,
            kind: DomainErrorKind::InsufficientFunds,
        })
    );
    assert!(!err.needs_reconciliation());
    assert_eq!(err.tx_hash(), None);
    assert_eq!(harness.store().write_attempts(), 0);
    assert!(harness.journal().all().is_empty());
}

#[tokio::test]
async fn test_reverted_transaction_is_not_mirrored() {
    let provider =
        MockChainProvider::new(account(), CHAIN).with_receipt_mode(ReceiptMode::Reverted);
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::OnChain(GatewayError::Reverted { .. })
    ));
    assert_eq!(harness.store().write_attempts(), 0);
    assert!(harness.journal().all().is_empty());
}

#[tokio::test]
async fn test_missing_event_is_reconciled_by_hash() {
    let tx_hash = TxHash::from_low_u64_be(0xdef);
    let provider = MockChainProvider::new(account(), CHAIN).with_tx_hash(tx_hash);
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::EventNotFound { .. }));
    assert_eq!(err.tx_hash(), Some(tx_hash));
    assert!(err.needs_reconciliation());
    assert_eq!(harness.store().write_attempts(), 0);

    // The stored receipt still has no recognizable event.
    let sweeper = harness.sweeper();
    assert_eq!(sweeper.sweep().await.unwrap().still_pending, 1);

    harness
        .provider()
        .insert_receipt(mined(tx_hash, vec![curator_registered("cur_1", 42)]));
    let report = sweeper.sweep().await.unwrap();
    assert_eq!(report.resolved, 1);

    let curator = harness.store().curator(account()).await.unwrap().unwrap();
    assert_eq!(curator.id, record_id(RecordKind::Curator, "cur_1"));
    assert_eq!(curator.transaction_hash, tx_hash);
    assert!(harness.journal().pending(10).await.unwrap().is_empty());
    assert_eq!(harness.provider().sent_transactions().len(), 1);
}

#[tokio::test]
async fn test_off_chain_retry_matches_first_attempt() {
    let provider = || {
        MockChainProvider::new(account(), CHAIN)
            .with_tx_hash(TxHash::from_low_u64_be(0xabc))
            .with_logs(vec![curator_registered("cur_1", 42)])
    };

    let clean = Harness::in_memory(provider());
    let expected = clean.coordinator.execute(register_curator()).await.unwrap();

    let harness = Harness::in_memory(provider());
    harness
        .store()
        .set_write_failure(Some(StoreError::Backend("connection reset".to_string())));
    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    let ReconciliationError::OffChainWriteFailed { fact, source } = err else {
        panic!("expected off-chain failure");
    };
    assert_eq!(source, StoreError::Backend("connection reset".to_string()));
    assert_eq!(fact.tx_hash, TxHash::from_low_u64_be(0xabc));
    assert_eq!(harness.store().curator_count(), 0);

    let incidents = harness.journal().all();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].kind, IncidentKind::OffChainWriteFailed);
    assert_eq!(incidents[0].fact(), Some(fact.clone()));

    harness.store().set_write_failure(None);
    let retried = harness
        .coordinator
        .retry_off_chain(&register_curator(), &fact)
        .await
        .unwrap();
    assert_eq!(retried, expected);
    assert_eq!(harness.provider().sent_transactions().len(), 1);

    // A second retry is an idempotent upsert.
    let again = harness
        .coordinator
        .retry_off_chain(&register_curator(), &fact)
        .await
        .unwrap();
    assert_eq!(again.record_id, expected.record_id);
    assert_eq!(harness.store().curator_count(), 1);
}

#[tokio::test]
async fn test_unconfirmed_transaction_resolves_on_sweep() {
    let tx_hash = TxHash::from_low_u64_be(0xabc);
    let provider = MockChainProvider::new(account(), CHAIN)
        .with_tx_hash(tx_hash)
        .with_receipt_mode(ReceiptMode::Dropped);
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReconciliationError::OnChain(GatewayError::Unconfirmed { tx_hash })
    );
    assert_eq!(harness.store().write_attempts(), 0);
    let incident = harness.journal().all().remove(0);
    assert_eq!(incident.kind, IncidentKind::Unconfirmed);

    let sweeper = harness.sweeper();
    assert_eq!(sweeper.sweep().await.unwrap().still_pending, 1);

    harness
        .provider()
        .insert_receipt(mined(tx_hash, vec![curator_registered("cur_1", 42)]));
    assert_eq!(sweeper.sweep().await.unwrap().resolved, 1);

    let resolved = harness.journal().get(incident.id).await.unwrap().unwrap();
    assert!(!resolved.is_pending());
    assert_eq!(resolved.attempts, 1);
    assert_eq!(harness.store().curator_count(), 1);
}

#[tokio::test]
async fn test_concurrent_loser_gets_conflict() {
    let provider = MockChainProvider::new(account(), CHAIN);
    provider.queue_logs(vec![book_borrowed(11)]);
    let harness = Harness::in_memory(provider);
    let coordinator = &harness.coordinator;

    let borrowing = coordinator
        .execute(borrow_book(3, ls_types::RecordId::nil()))
        .await
        .unwrap();
    coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Preparing))
        .await
        .unwrap();
    coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Dispatched))
        .await
        .unwrap();

    // Both callers validated against the same log; the other one mined later.
    let loser = ChainFact {
        tx_hash: TxHash::from_low_u64_be(0xbad),
        protocol_id: ProtocolId::BorrowingLog {
            borrowing_id: U256::from(11u64),
            status: BorrowingStatus::Dispatched,
        },
        actor: account(),
    };
    let err = coordinator
        .retry_off_chain(
            &append(borrowing.record_id, BorrowingStatus::Dispatched),
            &loser,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::OffChainWriteFailed {
            source: StoreError::Conflict(_),
            ..
        }
    ));
    assert_eq!(harness.store().log_entry_count(), 2);
}

#[tokio::test]
async fn test_wallet_missing_never_submits() {
    let provider = MockChainProvider::new(account(), CHAIN).unavailable_for(100);
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert_eq!(err, ReconciliationError::Wallet(DomainErrorKind::WalletMissing));
    assert!(harness.provider().sent_transactions().is_empty());
    assert_eq!(harness.store().write_attempts(), 0);
}

#[tokio::test]
async fn test_wrong_network_never_submits() {
    let provider = MockChainProvider::new(account(), ChainId(1))
        .fail_switch(RawChainError::with_code(4902, "Unrecognized chain ID"));
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert_eq!(err, ReconciliationError::Wallet(DomainErrorKind::WrongNetwork));
    assert_eq!(harness.provider().switch_requests(), vec![CHAIN]);
    assert!(harness.provider().sent_transactions().is_empty());
}

#[tokio::test]
async fn test_no_account_granted_is_disconnected() {
    let provider = MockChainProvider::new(account(), CHAIN)
        .without_exposed_accounts()
        .grant_no_accounts();
    let harness = Harness::in_memory(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReconciliationError::Wallet(DomainErrorKind::WalletDisconnected)
    );
    assert_eq!(harness.provider().account_requests(), 1);
}

#[tokio::test]
async fn test_journal_outage_keeps_off_chain_fact() {
    let provider =
        MockChainProvider::new(account(), CHAIN).with_logs(vec![curator_registered("cur_1", 42)]);
    let harness = Harness::in_memory(provider);
    harness.store().fail_next_writes(1);
    harness.journal().set_unavailable(true);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    let ReconciliationError::OffChainWriteFailed { fact, .. } = err else {
        panic!("expected off-chain failure");
    };
    assert_eq!(
        fact.protocol_id,
        ProtocolId::Curator {
            unique_id: "cur_1".to_string(),
            token_id: U256::from(42u64),
        }
    );
    assert!(harness.journal().all().is_empty());
}
