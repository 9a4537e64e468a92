//! In-memory mirror store.
//!
//! Enforces the same uniqueness rules as the relational schema. Writes can
//! be made to fail, and every write attempt is counted, failed or not.

use crate::domain::StoreError;
use crate::ports::MirrorStore;
use async_trait::async_trait;
use ls_types::{
    address_hex, Address, Book, BookRequest, BorrowingLogEntry, BorrowingRecord, Curator,
    RecordId, U256,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
struct Tables {
    curators: HashMap<Address, Curator>,
    books: HashMap<String, Book>,
    book_requests: HashMap<U256, BookRequest>,
    borrowings: HashMap<U256, BorrowingRecord>,
    logs: Vec<BorrowingLogEntry>,
}

/// `MirrorStore` held in process memory.
#[derive(Default)]
pub struct InMemoryMirrorStore {
    tables: RwLock<Tables>,
    write_attempts: AtomicU32,
    failing_writes: AtomicU32,
    fail_all: RwLock<Option<StoreError>>,
}

impl InMemoryMirrorStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write with `error` until cleared with `None`.
    pub fn set_write_failure(&self, error: Option<StoreError>) {
        *self.fail_all.write() = error;
    }

    /// Fail the next `count` writes with a backend error.
    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Writes attempted so far, including failed ones.
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Number of stored curators.
    pub fn curator_count(&self) -> usize {
        self.tables.read().curators.len()
    }

    /// Number of stored books.
    pub fn book_count(&self) -> usize {
        self.tables.read().books.len()
    }

    /// Number of stored borrowings.
    pub fn borrowing_count(&self) -> usize {
        self.tables.read().borrowings.len()
    }

    /// Number of stored log entries across all borrowings.
    pub fn log_entry_count(&self) -> usize {
        self.tables.read().logs.len()
    }

    /// Store a borrowing directly, bypassing failure injection.
    pub fn seed_borrowing(&self, record: BorrowingRecord) {
        self.tables
            .write()
            .borrowings
            .insert(record.on_chain_borrowing_id, record);
    }

    /// Store a log entry directly, bypassing failure injection.
    pub fn seed_log_entry(&self, entry: BorrowingLogEntry) {
        self.tables.write().logs.push(entry);
    }

    fn begin_write(&self) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fail_all.read().clone() {
            return Err(error);
        }
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirrorStore {
    async fn upsert_curator(&self, curator: Curator) -> Result<Curator, StoreError> {
        self.begin_write()?;
        let mut tables = self.tables.write();
        if tables.curators.values().any(|c| {
            c.wallet != curator.wallet && c.on_chain_unique_id == curator.on_chain_unique_id
        }) {
            return Err(StoreError::Conflict(format!(
                "curator {} already mirrored for another wallet",
                curator.on_chain_unique_id
            )));
        }
        let stored = match tables.curators.get(&curator.wallet) {
            Some(existing) => Curator {
                id: existing.id,
                created_at: existing.created_at,
                ..curator
            },
            None => curator,
        };
        tables.curators.insert(stored.wallet, stored.clone());
        Ok(stored)
    }

    async fn upsert_book(&self, book: Book) -> Result<Book, StoreError> {
        self.begin_write()?;
        let mut tables = self.tables.write();
        let stored = match tables.books.get(&book.on_chain_unique_id) {
            Some(existing) => Book {
                id: existing.id,
                created_at: existing.created_at,
                ..book
            },
            None => book,
        };
        tables
            .books
            .insert(stored.on_chain_unique_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn upsert_book_request(
        &self,
        request: BookRequest,
    ) -> Result<BookRequest, StoreError> {
        self.begin_write()?;
        let mut tables = self.tables.write();
        let stored = match tables.book_requests.get(&request.on_chain_request_id) {
            Some(existing) => BookRequest {
                id: existing.id,
                created_at: existing.created_at,
                ..request
            },
            None => request,
        };
        tables
            .book_requests
            .insert(stored.on_chain_request_id, stored.clone());
        Ok(stored)
    }

    async fn create_borrowing(
        &self,
        record: BorrowingRecord,
    ) -> Result<BorrowingRecord, StoreError> {
        self.begin_write()?;
        let mut tables = self.tables.write();
        let stored = tables
            .borrowings
            .entry(record.on_chain_borrowing_id)
            .or_insert(record);
        Ok(stored.clone())
    }

    async fn append_borrowing_log(
        &self,
        entry: BorrowingLogEntry,
    ) -> Result<BorrowingLogEntry, StoreError> {
        self.begin_write()?;
        let mut tables = self.tables.write();
        if !tables.borrowings.values().any(|b| b.id == entry.borrowing_id) {
            return Err(StoreError::NotFound(format!(
                "borrowing {}",
                entry.borrowing_id
            )));
        }
        if let Some(existing) = tables
            .logs
            .iter()
            .find(|e| e.borrowing_id == entry.borrowing_id && e.status == entry.status)
        {
            if existing.transaction_hash == entry.transaction_hash {
                return Ok(existing.clone());
            }
            return Err(StoreError::Conflict(format!(
                "borrowing {} already has status {}",
                entry.borrowing_id, entry.status
            )));
        }
        tables.logs.push(entry.clone());
        Ok(entry)
    }

    async fn borrowing(&self, id: RecordId) -> Result<Option<BorrowingRecord>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.borrowings.values().find(|b| b.id == id).cloned())
    }

    async fn borrowing_log(
        &self,
        borrowing_id: RecordId,
    ) -> Result<Vec<BorrowingLogEntry>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .logs
            .iter()
            .filter(|e| e.borrowing_id == borrowing_id)
            .cloned()
            .collect())
    }

    async fn curator(&self, wallet: Address) -> Result<Option<Curator>, StoreError> {
        Ok(self.tables.read().curators.get(&wallet).cloned())
    }

    async fn book(&self, unique_id: &str) -> Result<Option<Book>, StoreError> {
        Ok(self.tables.read().books.get(unique_id).cloned())
    }
}

impl std::fmt::Debug for InMemoryMirrorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("InMemoryMirrorStore")
            .field(
                "curators",
                &tables
                    .curators
                    .keys()
                    .map(address_hex)
                    .collect::<Vec<_>>(),
            )
            .field("books", &tables.books.len())
            .field("borrowings", &tables.borrowings.len())
            .field("logs", &tables.logs.len())
            .finish()
    }
}
