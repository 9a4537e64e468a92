//! # Outbound Ports
//!
//! Off-chain persistence the coordinator writes through.

use crate::domain::{ReconciliationIncident, StoreError};
use async_trait::async_trait;
use ls_types::{
    Address, Book, BookRequest, BorrowingLogEntry, BorrowingRecord, Curator, RecordId,
};
use uuid::Uuid;

/// Off-chain mirror store - outbound port.
///
/// Every write is an upsert keyed by a protocol identifier, so any write
/// may be repeated after a partial failure.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Insert or update the curator for `curator.wallet`.
    ///
    /// An existing row keeps its id and `created_at`.
    async fn upsert_curator(&self, curator: Curator) -> Result<Curator, StoreError>;

    /// Insert or update the book for `book.on_chain_unique_id`.
    async fn upsert_book(&self, book: Book) -> Result<Book, StoreError>;

    /// Insert or update the request for `request.on_chain_request_id`.
    async fn upsert_book_request(&self, request: BookRequest)
        -> Result<BookRequest, StoreError>;

    /// Create the borrowing for `record.on_chain_borrowing_id`.
    ///
    /// Returns the existing row unchanged if one is already stored.
    async fn create_borrowing(
        &self,
        record: BorrowingRecord,
    ) -> Result<BorrowingRecord, StoreError>;

    /// Append to a borrowing's log, unique on `(borrowing_id, status)`.
    ///
    /// A stored entry with the same transaction hash is returned as is.
    /// One with a different hash is a [`StoreError::Conflict`].
    async fn append_borrowing_log(
        &self,
        entry: BorrowingLogEntry,
    ) -> Result<BorrowingLogEntry, StoreError>;

    /// Borrowing by record id.
    async fn borrowing(&self, id: RecordId) -> Result<Option<BorrowingRecord>, StoreError>;

    /// A borrowing's log in creation order.
    async fn borrowing_log(
        &self,
        borrowing_id: RecordId,
    ) -> Result<Vec<BorrowingLogEntry>, StoreError>;

    /// Curator by wallet.
    async fn curator(&self, wallet: Address) -> Result<Option<Curator>, StoreError>;

    /// Book by on-chain unique id.
    async fn book(&self, unique_id: &str) -> Result<Option<Book>, StoreError>;
}

/// Reconciliation incident journal - outbound port.
#[async_trait]
pub trait IncidentJournal: Send + Sync {
    /// Insert or replace the incident with `incident.id`.
    async fn record(&self, incident: &ReconciliationIncident) -> Result<(), StoreError>;

    /// Up to `limit` unresolved incidents, oldest first.
    async fn pending(&self, limit: usize) -> Result<Vec<ReconciliationIncident>, StoreError>;

    /// Incident by id.
    async fn get(&self, id: Uuid) -> Result<Option<ReconciliationIncident>, StoreError>;
}
