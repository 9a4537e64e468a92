//! Mirror record construction.
//!
//! Turns an operation plus the chain fact it produced into the off-chain
//! row that mirrors it. Record ids come from the protocol identifier, so a
//! retried write always targets the row a first attempt would have created.

use crate::domain::{ChainFact, DomainOperation, ProtocolId, ReconciliationError};
use chrono::{DateTime, Utc};
use ls_types::{
    record_id, Book, BookRequest, BorrowingLogEntry, BorrowingRecord, Curator, RecordId,
};

/// One mirror row, ready to upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorRecord {
    /// Curator row
    Curator(Curator),
    /// Book row
    Book(Book),
    /// Book request row
    BookRequest(BookRequest),
    /// Borrowing row
    Borrowing(BorrowingRecord),
    /// Log entry row
    BorrowingLog(BorrowingLogEntry),
}

impl MirrorRecord {
    /// Deterministic id of the row.
    pub fn record_id(&self) -> RecordId {
        match self {
            MirrorRecord::Curator(r) => r.id,
            MirrorRecord::Book(r) => r.id,
            MirrorRecord::BookRequest(r) => r.id,
            MirrorRecord::Borrowing(r) => r.id,
            MirrorRecord::BorrowingLog(r) => r.id,
        }
    }
}

/// Build the mirror row for `op` from `fact`.
///
/// Fails with `MismatchedFact` when the fact was produced by a different
/// operation, or names a different log status than the one appended.
pub fn build_mirror(
    op: &DomainOperation,
    fact: &ChainFact,
    now: DateTime<Utc>,
) -> Result<MirrorRecord, ReconciliationError> {
    let kind = fact.protocol_id.record_kind();
    let record = match (op, &fact.protocol_id) {
        (
            DomainOperation::RegisterCurator { name, .. },
            ProtocolId::Curator {
                unique_id,
                token_id,
            },
        ) => MirrorRecord::Curator(Curator {
            id: record_id(kind, unique_id),
            wallet: fact.actor,
            name: name.clone(),
            on_chain_unique_id: unique_id.clone(),
            token_id: *token_id,
            transaction_hash: fact.tx_hash,
            created_at: now,
            updated_at: now,
        }),
        (
            DomainOperation::AddBook {
                title,
                author,
                metadata_uri,
            },
            ProtocolId::Book {
                unique_id,
                token_id,
            },
        ) => MirrorRecord::Book(Book {
            id: record_id(kind, unique_id),
            curator_wallet: fact.actor,
            title: title.clone(),
            author: author.clone(),
            metadata_uri: metadata_uri.clone(),
            on_chain_unique_id: unique_id.clone(),
            token_id: *token_id,
            transaction_hash: fact.tx_hash,
            created_at: now,
            updated_at: now,
        }),
        (
            DomainOperation::CreateBookRequest {
                book_id,
                return_date,
                ..
            },
            ProtocolId::BookRequest { id },
        ) => MirrorRecord::BookRequest(BookRequest {
            id: record_id(kind, &id.to_string()),
            on_chain_request_id: *id,
            book_id: *book_id,
            requester_wallet: fact.actor,
            return_date: *return_date,
            transaction_hash: fact.tx_hash,
            created_at: now,
        }),
        (
            DomainOperation::CreateBorrowing {
                book_id,
                borrower_wallet,
                borrow_date,
                return_date,
                ..
            },
            ProtocolId::Borrowing { id },
        ) => MirrorRecord::Borrowing(BorrowingRecord {
            id: record_id(kind, &id.to_string()),
            on_chain_borrowing_id: *id,
            book_id: *book_id,
            borrower_wallet: *borrower_wallet,
            borrow_date: *borrow_date,
            return_date: *return_date,
            transaction_hash: fact.tx_hash,
            created_at: now,
        }),
        (
            DomainOperation::AppendBorrowingLog {
                borrowing_record_id,
                status,
                message,
            },
            ProtocolId::BorrowingLog {
                status: fact_status,
                ..
            },
        ) if status == fact_status => MirrorRecord::BorrowingLog(BorrowingLogEntry {
            id: record_id(kind, &format!("{borrowing_record_id}:{status}")),
            borrowing_id: *borrowing_record_id,
            status: *status,
            message: message.clone(),
            actor_wallet: fact.actor,
            transaction_hash: fact.tx_hash,
            created_at: now,
        }),
        _ => {
            return Err(ReconciliationError::MismatchedFact {
                operation: op.kind(),
                fact: fact.clone(),
            })
        }
    };
    Ok(record)
}
