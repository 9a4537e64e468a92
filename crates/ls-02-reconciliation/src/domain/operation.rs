//! # Domain Operations
//!
//! What a caller asks for, the chain fact it produces, and the combined
//! result after both stores agree.

use super::errors::{ReconciliationError, StoreError};
use chrono::{DateTime, Utc};
use ls_01_chain_gateway::{ContractCall, DomainEvent, OperationKind};
use ls_types::{hash_hex, Address, BorrowingStatus, RecordId, RecordKind, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A state-changing action against both stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainOperation {
    /// Register the acting wallet as a curator.
    RegisterCurator {
        /// Display name
        name: String,
        /// Metadata location
        metadata_uri: String,
    },
    /// List a book under the acting curator.
    AddBook {
        /// Title
        title: String,
        /// Author
        author: String,
        /// Metadata location
        metadata_uri: String,
    },
    /// Request to borrow a listed book.
    CreateBookRequest {
        /// Off-chain book record
        book_id: RecordId,
        /// Book NFT token id
        book_token_id: U256,
        /// Requested return date
        return_date: DateTime<Utc>,
    },
    /// Turn a request into a borrowing.
    CreateBorrowing {
        /// On-chain request id
        request_id: U256,
        /// Off-chain book record
        book_id: RecordId,
        /// Borrowing wallet
        borrower_wallet: Address,
        /// Agreed start
        borrow_date: DateTime<Utc>,
        /// Agreed return
        return_date: DateTime<Utc>,
    },
    /// Append the next fulfillment status to a borrowing.
    AppendBorrowingLog {
        /// Off-chain borrowing record
        borrowing_record_id: RecordId,
        /// Status to append
        status: BorrowingStatus,
        /// Optional note
        message: Option<String>,
    },
}

fn unix_seconds(field: &str, t: &DateTime<Utc>) -> Result<u64, ReconciliationError> {
    u64::try_from(t.timestamp()).map_err(|_| {
        ReconciliationError::InvalidOperation(format!("{field} {t} is before the unix epoch"))
    })
}

impl DomainOperation {
    /// Registry entry for this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            DomainOperation::RegisterCurator { .. } => OperationKind::RegisterCurator,
            DomainOperation::AddBook { .. } => OperationKind::AddBook,
            DomainOperation::CreateBookRequest { .. } => OperationKind::CreateBookRequest,
            DomainOperation::CreateBorrowing { .. } => OperationKind::CreateBorrowing,
            DomainOperation::AppendBorrowingLog { .. } => OperationKind::AppendBorrowingLog,
        }
    }

    /// Contract call for this operation.
    ///
    /// Log appends need the on-chain borrowing id, which only the mirror
    /// store knows; the coordinator looks it up first. Dates are unsigned
    /// unix seconds on-chain, so pre-epoch dates are rejected.
    pub fn contract_call(
        &self,
        on_chain_borrowing_id: Option<U256>,
    ) -> Result<ContractCall, ReconciliationError> {
        let call = match self {
            DomainOperation::RegisterCurator { name, metadata_uri } => {
                ContractCall::RegisterCurator {
                    name: name.clone(),
                    metadata_uri: metadata_uri.clone(),
                }
            }
            DomainOperation::AddBook {
                title,
                author,
                metadata_uri,
            } => ContractCall::AddBook {
                title: title.clone(),
                author: author.clone(),
                metadata_uri: metadata_uri.clone(),
            },
            DomainOperation::CreateBookRequest {
                book_token_id,
                return_date,
                ..
            } => ContractCall::AddBookRequest {
                book_token_id: *book_token_id,
                return_date: unix_seconds("return date", return_date)?,
            },
            DomainOperation::CreateBorrowing {
                request_id,
                borrow_date,
                return_date,
                ..
            } => ContractCall::BorrowBook {
                request_id: *request_id,
                borrow_date: unix_seconds("borrow date", borrow_date)?,
                return_date: unix_seconds("return date", return_date)?,
            },
            DomainOperation::AppendBorrowingLog {
                status, message, ..
            } => ContractCall::AddBorrowingLog {
                borrowing_id: on_chain_borrowing_id.ok_or_else(|| {
                    ReconciliationError::Store(StoreError::NotFound(
                        "on-chain borrowing id".to_string(),
                    ))
                })?,
                status: *status,
                message: message.clone(),
            },
        };
        Ok(call)
    }
}

/// Protocol-assigned identifier of a chain fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolId {
    /// From `CuratorRegistered`
    Curator {
        /// Contract-assigned id
        unique_id: String,
        /// NFT token id
        token_id: U256,
    },
    /// From `BookAdded`
    Book {
        /// Contract-assigned id
        unique_id: String,
        /// NFT token id
        token_id: U256,
    },
    /// From `BookRequestAdded`
    BookRequest {
        /// Request id
        id: U256,
    },
    /// From `BookBorrowed`
    Borrowing {
        /// Borrowing id
        id: U256,
    },
    /// A log append: the borrowing plus the status reached
    BorrowingLog {
        /// On-chain borrowing id
        borrowing_id: U256,
        /// Appended status
        status: BorrowingStatus,
    },
}

impl ProtocolId {
    /// Identifier carried by a decoded event.
    pub fn from_event(event: DomainEvent) -> Self {
        match event {
            DomainEvent::CuratorRegistered {
                unique_id,
                token_id,
            } => ProtocolId::Curator {
                unique_id,
                token_id,
            },
            DomainEvent::BookAdded {
                unique_id,
                token_id,
            } => ProtocolId::Book {
                unique_id,
                token_id,
            },
            DomainEvent::BookRequestAdded { id } => ProtocolId::BookRequest { id },
            DomainEvent::BookBorrowed { borrowing_id } => ProtocolId::Borrowing { id: borrowing_id },
        }
    }

    /// Operation that produces this kind of identifier.
    pub fn operation(&self) -> OperationKind {
        match self {
            ProtocolId::Curator { .. } => OperationKind::RegisterCurator,
            ProtocolId::Book { .. } => OperationKind::AddBook,
            ProtocolId::BookRequest { .. } => OperationKind::CreateBookRequest,
            ProtocolId::Borrowing { .. } => OperationKind::CreateBorrowing,
            ProtocolId::BorrowingLog { .. } => OperationKind::AppendBorrowingLog,
        }
    }

    /// Mirror record family keyed by this identifier.
    pub fn record_kind(&self) -> RecordKind {
        match self {
            ProtocolId::Curator { .. } => RecordKind::Curator,
            ProtocolId::Book { .. } => RecordKind::Book,
            ProtocolId::BookRequest { .. } => RecordKind::BookRequest,
            ProtocolId::Borrowing { .. } => RecordKind::Borrowing,
            ProtocolId::BorrowingLog { .. } => RecordKind::BorrowingLog,
        }
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolId::Curator { unique_id, .. } | ProtocolId::Book { unique_id, .. } => {
                f.write_str(unique_id)
            }
            ProtocolId::BookRequest { id } | ProtocolId::Borrowing { id } => write!(f, "{id}"),
            ProtocolId::BorrowingLog {
                borrowing_id,
                status,
            } => write!(f, "{borrowing_id}/{status}"),
        }
    }
}

/// A durable on-chain effect whose mirror may still be missing.
///
/// Carries everything the off-chain half needs to be retried alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainFact {
    /// Confirmed transaction
    pub tx_hash: TxHash,
    /// Identifier recovered from the chain
    pub protocol_id: ProtocolId,
    /// Wallet that sent the transaction
    pub actor: Address,
}

impl fmt::Display for ChainFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.protocol_id, hash_hex(&self.tx_hash))
    }
}

/// Both stores agree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledWrite {
    /// Confirmed transaction
    pub transaction_hash: TxHash,
    /// Identifier recovered from the chain
    pub protocol_id: ProtocolId,
    /// Mirror row
    pub record_id: RecordId,
}
