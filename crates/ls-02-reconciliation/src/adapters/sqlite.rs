//! SQLite mirror store and incident journal.
//!
//! One connection guarded by a mutex serves both ports. Addresses and
//! hashes are stored as `0x` hex text, protocol integers as decimal text,
//! timestamps as RFC 3339. Incidents are kept as JSON bodies.

use crate::domain::{ReconciliationIncident, StoreError};
use crate::ports::{IncidentJournal, MirrorStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ls_types::{
    address_hex, hash_hex, parse_address, parse_hash, Address, Book, BookRequest,
    BorrowingLogEntry, BorrowingRecord, BorrowingStatus, Curator, RecordId, TxHash, U256,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS curators (
    id TEXT PRIMARY KEY,
    wallet TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    on_chain_unique_id TEXT NOT NULL UNIQUE,
    token_id TEXT NOT NULL,
    transaction_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    curator_wallet TEXT NOT NULL,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    metadata_uri TEXT NOT NULL,
    on_chain_unique_id TEXT NOT NULL UNIQUE,
    token_id TEXT NOT NULL,
    transaction_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS book_requests (
    id TEXT PRIMARY KEY,
    on_chain_request_id TEXT NOT NULL UNIQUE,
    book_id TEXT NOT NULL,
    requester_wallet TEXT NOT NULL,
    return_date TEXT NOT NULL,
    transaction_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS borrowings (
    id TEXT PRIMARY KEY,
    on_chain_borrowing_id TEXT NOT NULL UNIQUE,
    book_id TEXT NOT NULL,
    borrower_wallet TEXT NOT NULL,
    borrow_date TEXT NOT NULL,
    return_date TEXT NOT NULL,
    transaction_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS borrowing_logs (
    id TEXT PRIMARY KEY,
    borrowing_id TEXT NOT NULL REFERENCES borrowings(id),
    status INTEGER NOT NULL,
    message TEXT,
    actor_wallet TEXT NOT NULL,
    transaction_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (borrowing_id, status)
);
CREATE TABLE IF NOT EXISTS incidents (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    tx_hash TEXT NOT NULL,
    resolved INTEGER NOT NULL DEFAULT 0,
    body TEXT NOT NULL
);
";

fn store_err(e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(e.to_string())
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

fn column<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|message| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            message.into(),
        )
    })
}

fn uuid_col(s: &str) -> Result<Uuid, String> {
    Uuid::parse_str(s).map_err(|e| e.to_string())
}

fn address_col(s: &str) -> Result<Address, String> {
    parse_address(s).map_err(|e| e.to_string())
}

fn hash_col(s: &str) -> Result<TxHash, String> {
    parse_hash(s).map_err(|e| e.to_string())
}

fn u256_col(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| format!("{e:?}"))
}

fn time_col(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn curator_row(row: &Row<'_>) -> rusqlite::Result<Curator> {
    Ok(Curator {
        id: column(row, 0, uuid_col)?,
        wallet: column(row, 1, address_col)?,
        name: row.get(2)?,
        on_chain_unique_id: row.get(3)?,
        token_id: column(row, 4, u256_col)?,
        transaction_hash: column(row, 5, hash_col)?,
        created_at: column(row, 6, time_col)?,
        updated_at: column(row, 7, time_col)?,
    })
}

fn book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: column(row, 0, uuid_col)?,
        curator_wallet: column(row, 1, address_col)?,
        title: row.get(2)?,
        author: row.get(3)?,
        metadata_uri: row.get(4)?,
        on_chain_unique_id: row.get(5)?,
        token_id: column(row, 6, u256_col)?,
        transaction_hash: column(row, 7, hash_col)?,
        created_at: column(row, 8, time_col)?,
        updated_at: column(row, 9, time_col)?,
    })
}

fn book_request_row(row: &Row<'_>) -> rusqlite::Result<BookRequest> {
    Ok(BookRequest {
        id: column(row, 0, uuid_col)?,
        on_chain_request_id: column(row, 1, u256_col)?,
        book_id: column(row, 2, uuid_col)?,
        requester_wallet: column(row, 3, address_col)?,
        return_date: column(row, 4, time_col)?,
        transaction_hash: column(row, 5, hash_col)?,
        created_at: column(row, 6, time_col)?,
    })
}

fn borrowing_row(row: &Row<'_>) -> rusqlite::Result<BorrowingRecord> {
    Ok(BorrowingRecord {
        id: column(row, 0, uuid_col)?,
        on_chain_borrowing_id: column(row, 1, u256_col)?,
        book_id: column(row, 2, uuid_col)?,
        borrower_wallet: column(row, 3, address_col)?,
        borrow_date: column(row, 4, time_col)?,
        return_date: column(row, 5, time_col)?,
        transaction_hash: column(row, 6, hash_col)?,
        created_at: column(row, 7, time_col)?,
    })
}

fn log_row(row: &Row<'_>) -> rusqlite::Result<BorrowingLogEntry> {
    let code: u8 = row.get(2)?;
    let status = BorrowingStatus::from_code(code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            format!("unknown status code {code}").into(),
        )
    })?;
    Ok(BorrowingLogEntry {
        id: column(row, 0, uuid_col)?,
        borrowing_id: column(row, 1, uuid_col)?,
        status,
        message: row.get(3)?,
        actor_wallet: column(row, 4, address_col)?,
        transaction_hash: column(row, 5, hash_col)?,
        created_at: column(row, 6, time_col)?,
    })
}

const CURATOR_COLUMNS: &str =
    "id, wallet, name, on_chain_unique_id, token_id, transaction_hash, created_at, updated_at";
const BOOK_COLUMNS: &str = "id, curator_wallet, title, author, metadata_uri, on_chain_unique_id, \
     token_id, transaction_hash, created_at, updated_at";
const BOOK_REQUEST_COLUMNS: &str =
    "id, on_chain_request_id, book_id, requester_wallet, return_date, transaction_hash, created_at";
const BORROWING_COLUMNS: &str = "id, on_chain_borrowing_id, book_id, borrower_wallet, \
     borrow_date, return_date, transaction_hash, created_at";
const LOG_COLUMNS: &str =
    "id, borrowing_id, status, message, actor_wallet, transaction_hash, created_at";

/// `MirrorStore` and `IncidentJournal` on one SQLite database.
pub struct SqliteMirrorStore {
    db: Mutex<Connection>,
}

impl SqliteMirrorStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Connection::open(path.as_ref()).map_err(store_err)?;
        db.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(store_err)?;
        let store = Self::init(db)?;
        info!(path = %path.as_ref().display(), "Mirror store opened");
        Ok(store)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory().map_err(store_err)?)
    }

    fn init(db: Connection) -> Result<Self, StoreError> {
        db.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(store_err)?;
        db.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn select_one<T>(
        db: &Connection,
        sql: &str,
        key: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, StoreError> {
        db.query_row(sql, [key], map).optional().map_err(store_err)
    }

    fn require<T>(found: Option<T>, what: String) -> Result<T, StoreError> {
        found.ok_or(StoreError::NotFound(what))
    }
}

#[async_trait]
impl MirrorStore for SqliteMirrorStore {
    async fn upsert_curator(&self, curator: Curator) -> Result<Curator, StoreError> {
        let db = self.db.lock();
        let wallet = address_hex(&curator.wallet);
        db.execute(
            "INSERT INTO curators (id, wallet, name, on_chain_unique_id, token_id, transaction_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(wallet) DO UPDATE SET
                name = excluded.name,
                on_chain_unique_id = excluded.on_chain_unique_id,
                token_id = excluded.token_id,
                transaction_hash = excluded.transaction_hash,
                updated_at = excluded.updated_at",
            params![
                curator.id.to_string(),
                wallet,
                curator.name,
                curator.on_chain_unique_id,
                curator.token_id.to_string(),
                hash_hex(&curator.transaction_hash),
                curator.created_at.to_rfc3339(),
                curator.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        debug!(wallet = %wallet, unique_id = %curator.on_chain_unique_id, "Upserted curator");

        let sql = format!("SELECT {CURATOR_COLUMNS} FROM curators WHERE wallet = ?1");
        Self::require(
            Self::select_one(&db, &sql, &wallet, curator_row)?,
            format!("curator {wallet}"),
        )
    }

    async fn upsert_book(&self, book: Book) -> Result<Book, StoreError> {
        let db = self.db.lock();
        db.execute(
            "INSERT INTO books (id, curator_wallet, title, author, metadata_uri, on_chain_unique_id, token_id, transaction_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(on_chain_unique_id) DO UPDATE SET
                curator_wallet = excluded.curator_wallet,
                title = excluded.title,
                author = excluded.author,
                metadata_uri = excluded.metadata_uri,
                token_id = excluded.token_id,
                transaction_hash = excluded.transaction_hash,
                updated_at = excluded.updated_at",
            params![
                book.id.to_string(),
                address_hex(&book.curator_wallet),
                book.title,
                book.author,
                book.metadata_uri,
                book.on_chain_unique_id,
                book.token_id.to_string(),
                hash_hex(&book.transaction_hash),
                book.created_at.to_rfc3339(),
                book.updated_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        debug!(unique_id = %book.on_chain_unique_id, "Upserted book");

        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE on_chain_unique_id = ?1");
        Self::require(
            Self::select_one(&db, &sql, &book.on_chain_unique_id, book_row)?,
            format!("book {}", book.on_chain_unique_id),
        )
    }

    async fn upsert_book_request(
        &self,
        request: BookRequest,
    ) -> Result<BookRequest, StoreError> {
        let db = self.db.lock();
        let key = request.on_chain_request_id.to_string();
        db.execute(
            "INSERT INTO book_requests (id, on_chain_request_id, book_id, requester_wallet, return_date, transaction_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(on_chain_request_id) DO UPDATE SET
                book_id = excluded.book_id,
                requester_wallet = excluded.requester_wallet,
                return_date = excluded.return_date,
                transaction_hash = excluded.transaction_hash",
            params![
                request.id.to_string(),
                key,
                request.book_id.to_string(),
                address_hex(&request.requester_wallet),
                request.return_date.to_rfc3339(),
                hash_hex(&request.transaction_hash),
                request.created_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;

        let sql =
            format!("SELECT {BOOK_REQUEST_COLUMNS} FROM book_requests WHERE on_chain_request_id = ?1");
        Self::require(
            Self::select_one(&db, &sql, &key, book_request_row)?,
            format!("book request {key}"),
        )
    }

    async fn create_borrowing(
        &self,
        record: BorrowingRecord,
    ) -> Result<BorrowingRecord, StoreError> {
        let db = self.db.lock();
        let key = record.on_chain_borrowing_id.to_string();
        db.execute(
            "INSERT INTO borrowings (id, on_chain_borrowing_id, book_id, borrower_wallet, borrow_date, return_date, transaction_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(on_chain_borrowing_id) DO NOTHING",
            params![
                record.id.to_string(),
                key,
                record.book_id.to_string(),
                address_hex(&record.borrower_wallet),
                record.borrow_date.to_rfc3339(),
                record.return_date.to_rfc3339(),
                hash_hex(&record.transaction_hash),
                record.created_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;

        let sql =
            format!("SELECT {BORROWING_COLUMNS} FROM borrowings WHERE on_chain_borrowing_id = ?1");
        Self::require(
            Self::select_one(&db, &sql, &key, borrowing_row)?,
            format!("borrowing {key}"),
        )
    }

    async fn append_borrowing_log(
        &self,
        entry: BorrowingLogEntry,
    ) -> Result<BorrowingLogEntry, StoreError> {
        let db = self.db.lock();
        let borrowing_id = entry.borrowing_id.to_string();

        let sql = format!("SELECT {BORROWING_COLUMNS} FROM borrowings WHERE id = ?1");
        Self::require(
            Self::select_one(&db, &sql, &borrowing_id, borrowing_row)?,
            format!("borrowing {borrowing_id}"),
        )?;

        let existing = db
            .query_row(
                &format!(
                    "SELECT {LOG_COLUMNS} FROM borrowing_logs WHERE borrowing_id = ?1 AND status = ?2"
                ),
                params![borrowing_id, entry.status.code()],
                log_row,
            )
            .optional()
            .map_err(store_err)?;
        if let Some(existing) = existing {
            if existing.transaction_hash == entry.transaction_hash {
                return Ok(existing);
            }
            return Err(StoreError::Conflict(format!(
                "borrowing {borrowing_id} already has status {}",
                entry.status
            )));
        }

        db.execute(
            "INSERT INTO borrowing_logs (id, borrowing_id, status, message, actor_wallet, transaction_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.to_string(),
                borrowing_id,
                entry.status.code(),
                entry.message,
                address_hex(&entry.actor_wallet),
                hash_hex(&entry.transaction_hash),
                entry.created_at.to_rfc3339(),
            ],
        )
        .map_err(store_err)?;
        debug!(borrowing_id = %borrowing_id, status = %entry.status, "Appended borrowing log");
        Ok(entry)
    }

    async fn borrowing(&self, id: RecordId) -> Result<Option<BorrowingRecord>, StoreError> {
        let db = self.db.lock();
        let sql = format!("SELECT {BORROWING_COLUMNS} FROM borrowings WHERE id = ?1");
        Self::select_one(&db, &sql, &id.to_string(), borrowing_row)
    }

    async fn borrowing_log(
        &self,
        borrowing_id: RecordId,
    ) -> Result<Vec<BorrowingLogEntry>, StoreError> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare_cached(&format!(
                "SELECT {LOG_COLUMNS} FROM borrowing_logs WHERE borrowing_id = ?1 ORDER BY rowid"
            ))
            .map_err(store_err)?;
        let rows = stmt
            .query_map([borrowing_id.to_string()], log_row)
            .map_err(store_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err)
    }

    async fn curator(&self, wallet: Address) -> Result<Option<Curator>, StoreError> {
        let db = self.db.lock();
        let sql = format!("SELECT {CURATOR_COLUMNS} FROM curators WHERE wallet = ?1");
        Self::select_one(&db, &sql, &address_hex(&wallet), curator_row)
    }

    async fn book(&self, unique_id: &str) -> Result<Option<Book>, StoreError> {
        let db = self.db.lock();
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE on_chain_unique_id = ?1");
        Self::select_one(&db, &sql, unique_id, book_row)
    }
}

fn incident_body(body: String) -> Result<ReconciliationIncident, StoreError> {
    serde_json::from_str(&body).map_err(|e| StoreError::Backend(format!("corrupt incident: {e}")))
}

#[async_trait]
impl IncidentJournal for SqliteMirrorStore {
    async fn record(&self, incident: &ReconciliationIncident) -> Result<(), StoreError> {
        let body = serde_json::to_string(incident)
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        let db = self.db.lock();
        db.execute(
            "INSERT INTO incidents (id, kind, tx_hash, resolved, body)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                resolved = excluded.resolved,
                body = excluded.body",
            params![
                incident.id.to_string(),
                incident.kind.as_str(),
                hash_hex(&incident.tx_hash),
                !incident.is_pending(),
                body,
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    async fn pending(&self, limit: usize) -> Result<Vec<ReconciliationIncident>, StoreError> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare_cached("SELECT body FROM incidents WHERE resolved = 0 ORDER BY rowid LIMIT ?1")
            .map_err(store_err)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let bodies = stmt
            .query_map([limit], |row| row.get::<_, String>(0))
            .map_err(store_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(store_err)?;
        bodies.into_iter().map(incident_body).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReconciliationIncident>, StoreError> {
        let db = self.db.lock();
        let body = db
            .query_row(
                "SELECT body FROM incidents WHERE id = ?1",
                [id.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(store_err)?;
        body.map(incident_body).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainOperation, IncidentKind};
    use ls_types::{record_id, RecordKind};

    fn store() -> SqliteMirrorStore {
        SqliteMirrorStore::open_in_memory().unwrap()
    }

    fn curator(wallet: u8, unique_id: &str) -> Curator {
        let now = Utc::now();
        Curator {
            id: record_id(RecordKind::Curator, unique_id),
            wallet: Address::repeat_byte(wallet),
            name: "Acme Library".to_string(),
            on_chain_unique_id: unique_id.to_string(),
            token_id: U256::from(42u64),
            transaction_hash: TxHash::from_low_u64_be(0xabc),
            created_at: now,
            updated_at: now,
        }
    }

    fn borrowing() -> BorrowingRecord {
        let now = Utc::now();
        BorrowingRecord {
            id: record_id(RecordKind::Borrowing, "7"),
            on_chain_borrowing_id: U256::from(7u64),
            book_id: RecordId::nil(),
            borrower_wallet: Address::repeat_byte(3),
            borrow_date: now,
            return_date: now,
            transaction_hash: TxHash::from_low_u64_be(70),
            created_at: now,
        }
    }

    fn log_entry(status: BorrowingStatus, tx: u64) -> BorrowingLogEntry {
        BorrowingLogEntry {
            id: record_id(RecordKind::BorrowingLog, &format!("{}:{status}", borrowing().id)),
            borrowing_id: borrowing().id,
            status,
            message: Some("note".to_string()),
            actor_wallet: Address::repeat_byte(1),
            transaction_hash: TxHash::from_low_u64_be(tx),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_book_request_round_trips_return_date() {
        let store = store();
        let now = Utc::now();
        let request = BookRequest {
            id: record_id(RecordKind::BookRequest, "3"),
            on_chain_request_id: U256::from(3u64),
            book_id: RecordId::nil(),
            requester_wallet: Address::repeat_byte(4),
            return_date: now + chrono::Duration::days(14),
            transaction_hash: TxHash::from_low_u64_be(30),
            created_at: now,
        };
        let stored = store.upsert_book_request(request.clone()).await.unwrap();
        assert_eq!(stored, request);
    }

    #[tokio::test]
    async fn test_existing_wallet_cannot_take_another_unique_id() {
        let store = store();
        store.upsert_curator(curator(1, "cur_1")).await.unwrap();
        store.upsert_curator(curator(2, "cur_2")).await.unwrap();
        assert!(matches!(
            store.upsert_curator(curator(2, "cur_1")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_curator_upsert_is_idempotent() {
        let store = store();
        let first = store.upsert_curator(curator(1, "cur_1")).await.unwrap();
        let mut renamed = curator(1, "cur_1");
        renamed.name = "Acme Public Library".to_string();
        let second = store.upsert_curator(renamed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.name, "Acme Public Library");
        assert_eq!(
            store.curator(Address::repeat_byte(1)).await.unwrap(),
            Some(second)
        );
    }

    #[tokio::test]
    async fn test_unique_id_conflict_across_wallets() {
        let store = store();
        store.upsert_curator(curator(1, "cur_1")).await.unwrap();
        assert!(matches!(
            store.upsert_curator(curator(2, "cur_1")).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_log_append_policy() {
        let store = store();
        store.create_borrowing(borrowing()).await.unwrap();

        let entry = log_entry(BorrowingStatus::Preparing, 1);
        assert_eq!(store.append_borrowing_log(entry.clone()).await.unwrap(), entry);
        assert_eq!(store.append_borrowing_log(entry.clone()).await.unwrap(), entry);
        assert!(matches!(
            store
                .append_borrowing_log(log_entry(BorrowingStatus::Preparing, 2))
                .await,
            Err(StoreError::Conflict(_))
        ));

        store
            .append_borrowing_log(log_entry(BorrowingStatus::Dispatched, 3))
            .await
            .unwrap();
        let log = store.borrowing_log(borrowing().id).await.unwrap();
        let statuses: Vec<_> = log.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![BorrowingStatus::Preparing, BorrowingStatus::Dispatched]
        );
    }

    #[tokio::test]
    async fn test_log_without_borrowing_is_not_found() {
        let store = store();
        assert!(matches!(
            store
                .append_borrowing_log(log_entry(BorrowingStatus::Preparing, 1))
                .await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_borrowing_keeps_first_row() {
        let store = store();
        let first = store.create_borrowing(borrowing()).await.unwrap();
        let mut replay = borrowing();
        replay.borrower_wallet = Address::repeat_byte(9);
        assert_eq!(store.create_borrowing(replay).await.unwrap(), first);
        assert_eq!(store.borrowing(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_incident_journal_roundtrip() {
        let store = store();
        let mut incident = ReconciliationIncident::open(
            IncidentKind::EventNotFound,
            DomainOperation::RegisterCurator {
                name: "Acme".to_string(),
                metadata_uri: String::new(),
            },
            TxHash::from_low_u64_be(5),
            Address::repeat_byte(1),
            None,
            "no event",
        );
        store.record(&incident).await.unwrap();
        assert_eq!(store.pending(10).await.unwrap(), vec![incident.clone()]);

        incident.resolve();
        store.record(&incident).await.unwrap();
        assert!(store.pending(10).await.unwrap().is_empty());
        assert_eq!(store.get(incident.id).await.unwrap(), Some(incident));
    }
}
