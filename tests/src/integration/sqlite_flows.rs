//! The same flows against the SQLite mirror, which doubles as the journal.

use super::fixtures::*;
use ls_01_chain_gateway::{MockChainProvider, ReceiptMode, TransactionReceipt};
use ls_02_reconciliation::{
    ChainFact, IncidentJournal, IncidentKind, MirrorStore, ProtocolId, ReconciliationApi,
    ReconciliationError, SqliteMirrorStore, StoreError,
};
use ls_types::{record_id, BorrowingStatus, RecordKind, TxHash, U256};
use std::sync::Arc;

fn sqlite_harness(provider: MockChainProvider) -> Harness<SqliteMirrorStore, SqliteMirrorStore> {
    let store = Arc::new(SqliteMirrorStore::open_in_memory().unwrap());
    Harness::with_stores(provider, store.clone(), store)
}

#[tokio::test]
async fn test_lending_lifecycle_on_sqlite() {
    let provider = MockChainProvider::new(account(), CHAIN);
    provider.queue_logs(vec![curator_registered("cur_1", 42)]);
    provider.queue_logs(vec![book_added("book_1", 7)]);
    provider.queue_logs(vec![book_request_added(3)]);
    provider.queue_logs(vec![book_borrowed(11)]);
    let harness = sqlite_harness(provider);
    let coordinator = &harness.coordinator;

    coordinator.execute(register_curator()).await.unwrap();
    let book = coordinator.execute(add_book()).await.unwrap();
    coordinator
        .execute(request_book(book.record_id, 7))
        .await
        .unwrap();
    let borrowing = coordinator
        .execute(borrow_book(3, book.record_id))
        .await
        .unwrap();
    for status in BorrowingStatus::ORDER {
        coordinator
            .execute(append(borrowing.record_id, status))
            .await
            .unwrap();
    }

    let store = harness.store();
    let curator = store.curator(account()).await.unwrap().unwrap();
    assert_eq!(curator.id, record_id(RecordKind::Curator, "cur_1"));
    assert_eq!(curator.token_id, U256::from(42u64));

    let stored = store.borrowing(borrowing.record_id).await.unwrap().unwrap();
    assert_eq!(stored.on_chain_borrowing_id, U256::from(11u64));
    assert_eq!(stored.borrow_date, date(6));

    let log = store.borrowing_log(borrowing.record_id).await.unwrap();
    let statuses: Vec<_> = log.iter().map(|e| e.status).collect();
    assert_eq!(statuses, BorrowingStatus::ORDER.to_vec());

    let err = coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Returned))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconciliationError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_sqlite_uniqueness_rejects_concurrent_loser() {
    let provider = MockChainProvider::new(account(), CHAIN);
    provider.queue_logs(vec![book_added("book_1", 7)]);
    provider.queue_logs(vec![book_borrowed(11)]);
    let harness = sqlite_harness(provider);
    let coordinator = &harness.coordinator;

    let book = coordinator.execute(add_book()).await.unwrap();
    let borrowing = coordinator
        .execute(borrow_book(3, book.record_id))
        .await
        .unwrap();
    let winner = coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Preparing))
        .await
        .unwrap();

    let loser = ChainFact {
        tx_hash: TxHash::from_low_u64_be(0xbad),
        protocol_id: ProtocolId::BorrowingLog {
            borrowing_id: U256::from(11u64),
            status: BorrowingStatus::Preparing,
        },
        actor: account(),
    };
    let err = coordinator
        .retry_off_chain(
            &append(borrowing.record_id, BorrowingStatus::Preparing),
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

    // Replaying the winner's own fact is a no-op.
    let replay = ChainFact {
        tx_hash: winner.transaction_hash,
        ..loser
    };
    let again = coordinator
        .retry_off_chain(
            &append(borrowing.record_id, BorrowingStatus::Preparing),
            &replay,
        )
        .await
        .unwrap();
    assert_eq!(again.record_id, winner.record_id);
    assert_eq!(
        harness
            .store()
            .borrowing_log(borrowing.record_id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_sqlite_journal_survives_sweep() {
    let tx_hash = TxHash::from_low_u64_be(0xabc);
    let provider = MockChainProvider::new(account(), CHAIN)
        .with_tx_hash(tx_hash)
        .with_receipt_mode(ReceiptMode::Dropped);
    let harness = sqlite_harness(provider);

    let err = harness
        .coordinator
        .execute(register_curator())
        .await
        .unwrap_err();
    assert!(err.needs_reconciliation());

    let pending = harness.journal().pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, IncidentKind::Unconfirmed);
    assert_eq!(pending[0].tx_hash, tx_hash);

    harness.provider().insert_receipt(TransactionReceipt {
        tx_hash,
        block_number: 12,
        status: true,
        gas_used: 90_000,
        logs: vec![curator_registered("cur_1", 42)],
    });
    let report = harness.sweeper().sweep().await.unwrap();
    assert_eq!(report.resolved, 1);

    assert!(harness.journal().pending(10).await.unwrap().is_empty());
    let resolved = harness.journal().get(pending[0].id).await.unwrap().unwrap();
    assert_eq!(resolved.kind, IncidentKind::OffChainWriteFailed);
    assert!(resolved.resolved_at.is_some());
    assert!(harness.store().curator(account()).await.unwrap().is_some());
}
