//! Happy paths: every operation reaches both stores with one transaction.

use super::fixtures::*;
use ls_01_chain_gateway::MockChainProvider;
use ls_02_reconciliation::{
    InvalidTransition, MirrorStore, ProtocolId, ReconciliationApi, ReconciliationError,
};
use ls_types::{record_id, BorrowingStatus, RecordKind, TxHash, U256};

#[tokio::test]
async fn test_register_curator_end_to_end() {
    let provider = MockChainProvider::new(account(), CHAIN)
        .with_tx_hash(TxHash::from_low_u64_be(0xabc))
        .with_logs(vec![curator_registered("cur_1", 42)]);
    let harness = Harness::in_memory(provider);

    let write = harness.coordinator.execute(register_curator()).await.unwrap();

    assert_eq!(write.transaction_hash, TxHash::from_low_u64_be(0xabc));
    assert_eq!(
        write.protocol_id,
        ProtocolId::Curator {
            unique_id: "cur_1".to_string(),
            token_id: U256::from(42u64),
        }
    );
    assert_eq!(write.record_id, record_id(RecordKind::Curator, "cur_1"));

    let sent = harness.provider().sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, contract());
    assert_eq!(sent[0].from, account());
    assert_eq!(sent[0].gas, Some(120_000));

    let curator = harness.store().curator(account()).await.unwrap().unwrap();
    assert_eq!(curator.name, "Acme Library");
    assert_eq!(curator.on_chain_unique_id, "cur_1");
    assert_eq!(curator.transaction_hash, write.transaction_hash);
    assert!(harness.journal().all().is_empty());
}

#[tokio::test]
async fn test_full_lending_lifecycle() {
    let provider = MockChainProvider::new(account(), CHAIN);
    provider.queue_logs(vec![curator_registered("cur_1", 42)]);
    provider.queue_logs(vec![book_added("book_1", 7)]);
    provider.queue_logs(vec![book_request_added(3)]);
    provider.queue_logs(vec![book_borrowed(11)]);
    let harness = Harness::in_memory(provider);
    let coordinator = &harness.coordinator;

    coordinator.execute(register_curator()).await.unwrap();
    let book = coordinator.execute(add_book()).await.unwrap();
    assert_eq!(book.record_id, record_id(RecordKind::Book, "book_1"));
    let stored_book = harness.store().book("book_1").await.unwrap().unwrap();
    assert_eq!(stored_book.curator_wallet, account());
    assert_eq!(stored_book.token_id, U256::from(7u64));

    let request = coordinator
        .execute(request_book(book.record_id, 7))
        .await
        .unwrap();
    assert_eq!(request.protocol_id, ProtocolId::BookRequest { id: U256::from(3u64) });
    assert_eq!(request.record_id, record_id(RecordKind::BookRequest, "3"));

    let borrowing = coordinator
        .execute(borrow_book(3, book.record_id))
        .await
        .unwrap();
    assert_eq!(borrowing.record_id, record_id(RecordKind::Borrowing, "11"));
    let stored = harness
        .store()
        .borrowing(borrowing.record_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.on_chain_borrowing_id, U256::from(11u64));
    assert_eq!(stored.book_id, book.record_id);
    assert_eq!(stored.return_date, date(20));

    for status in BorrowingStatus::ORDER {
        let write = coordinator
            .execute(append(borrowing.record_id, status))
            .await
            .unwrap();
        assert_eq!(
            write.protocol_id,
            ProtocolId::BorrowingLog {
                borrowing_id: U256::from(11u64),
                status,
            }
        );
    }

    let log = harness
        .store()
        .borrowing_log(borrowing.record_id)
        .await
        .unwrap();
    let statuses: Vec<_> = log.iter().map(|e| e.status).collect();
    assert_eq!(statuses, BorrowingStatus::ORDER.to_vec());
    assert_eq!(harness.provider().sent_transactions().len(), 8);

    let err = coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Returned))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReconciliationError::InvalidTransition(InvalidTransition {
            expected: None,
            got: BorrowingStatus::Returned,
        })
    );
    assert_eq!(harness.provider().sent_transactions().len(), 8);
    assert_eq!(harness.store().log_entry_count(), 4);
}

#[tokio::test]
async fn test_skipped_status_is_rejected_before_submission() {
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
    let sent_before = harness.provider().sent_transactions().len();
    let writes_before = harness.store().write_attempts();

    let err = coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Delivered))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ReconciliationError::InvalidTransition(InvalidTransition {
            expected: Some(BorrowingStatus::Dispatched),
            got: BorrowingStatus::Delivered,
        })
    );
    assert_eq!(harness.provider().sent_transactions().len(), sent_before);
    assert_eq!(harness.store().write_attempts(), writes_before);

    coordinator
        .execute(append(borrowing.record_id, BorrowingStatus::Dispatched))
        .await
        .unwrap();
    assert_eq!(harness.store().log_entry_count(), 2);
}
