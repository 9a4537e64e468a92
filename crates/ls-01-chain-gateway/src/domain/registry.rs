//! # Event-Shape Registry
//!
//! Static mapping from each ledger operation to the contract method it calls
//! and the event it emits. Call sites and the decoder both read from here,
//! so a new operation needs exactly one entry.
//!
//! The registry must move in lockstep with the deployed contract ABI; bump
//! [`REGISTRY_VERSION`] whenever a signature changes.

use super::abi::{ParamType, Token};
use crate::algorithms::abi::event_topic;
use ls_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contract ABI revision this registry matches.
pub const REGISTRY_VERSION: &str = "library-share-ledger/1";

/// Domain operations that go through the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Mint a curator NFT for the caller's wallet.
    RegisterCurator,
    /// Mint a book NFT owned by a curator.
    AddBook,
    /// Request to borrow a book.
    CreateBookRequest,
    /// Turn an accepted request into a borrowing.
    CreateBorrowing,
    /// Advance a borrowing's fulfillment status.
    AppendBorrowingLog,
}

impl OperationKind {
    /// Every operation, in registry order.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::RegisterCurator,
        OperationKind::AddBook,
        OperationKind::CreateBookRequest,
        OperationKind::CreateBorrowing,
        OperationKind::AppendBorrowingLog,
    ];

    /// Contract method signature.
    pub fn method_signature(&self) -> &'static str {
        match self {
            OperationKind::RegisterCurator => "registerCurator(string,string)",
            OperationKind::AddBook => "addBook(string,string,string)",
            OperationKind::CreateBookRequest => "addBookRequest(uint256,uint256)",
            OperationKind::CreateBorrowing => "borrowBook(uint256,uint256,uint256)",
            OperationKind::AppendBorrowingLog => "addBorrowingLog(uint256,uint8,string)",
        }
    }

    /// Event the call emits on success.
    ///
    /// `None` for log appends: the identifier is already known to the caller.
    pub fn event_shape(&self) -> Option<EventShape> {
        match self {
            OperationKind::RegisterCurator => Some(EventShape::CuratorRegistered),
            OperationKind::AddBook => Some(EventShape::BookAdded),
            OperationKind::CreateBookRequest => Some(EventShape::BookRequestAdded),
            OperationKind::CreateBorrowing => Some(EventShape::BookBorrowed),
            OperationKind::AppendBorrowingLog => None,
        }
    }

    /// Snake-case name for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::RegisterCurator => "register_curator",
            OperationKind::AddBook => "add_book",
            OperationKind::CreateBookRequest => "create_book_request",
            OperationKind::CreateBorrowing => "create_borrowing",
            OperationKind::AppendBorrowingLog => "append_borrowing_log",
        }
    }

    /// Inverse of [`OperationKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known event shapes.
///
/// None of the ledger events index their parameters, so every field lives
/// in the log data and `topics[0]` is the only topic checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventShape {
    /// `CuratorRegistered(string uniqueId, uint256 tokenId)`
    CuratorRegistered,
    /// `BookAdded(string uniqueId, uint256 tokenId)`
    BookAdded,
    /// `BookRequestAdded(uint256 id)`
    BookRequestAdded,
    /// `BookBorrowed(uint256 borrowingId)`
    BookBorrowed,
}

impl EventShape {
    /// Canonical event signature.
    pub fn signature(&self) -> &'static str {
        match self {
            EventShape::CuratorRegistered => "CuratorRegistered(string,uint256)",
            EventShape::BookAdded => "BookAdded(string,uint256)",
            EventShape::BookRequestAdded => "BookRequestAdded(uint256)",
            EventShape::BookBorrowed => "BookBorrowed(uint256)",
        }
    }

    /// Parameter layout of the log data.
    pub fn params(&self) -> &'static [ParamType] {
        match self {
            EventShape::CuratorRegistered | EventShape::BookAdded => {
                &[ParamType::String, ParamType::Uint]
            }
            EventShape::BookRequestAdded | EventShape::BookBorrowed => &[ParamType::Uint],
        }
    }

    /// `topics[0]` for this event.
    pub fn topic(&self) -> H256 {
        event_topic(self.signature())
    }

    /// Build the typed event from decoded tokens.
    ///
    /// Returns `None` if the tokens do not fit the shape.
    pub fn build(&self, tokens: Vec<Token>) -> Option<DomainEvent> {
        let mut it = tokens.into_iter();
        let event = match self {
            EventShape::CuratorRegistered => DomainEvent::CuratorRegistered {
                unique_id: it.next()?.into_string()?,
                token_id: it.next()?.into_uint()?,
            },
            EventShape::BookAdded => DomainEvent::BookAdded {
                unique_id: it.next()?.into_string()?,
                token_id: it.next()?.into_uint()?,
            },
            EventShape::BookRequestAdded => DomainEvent::BookRequestAdded {
                id: it.next()?.into_uint()?,
            },
            EventShape::BookBorrowed => DomainEvent::BookBorrowed {
                borrowing_id: it.next()?.into_uint()?,
            },
        };
        if it.next().is_some() {
            return None;
        }
        Some(event)
    }
}

impl fmt::Display for EventShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// Typed events recovered from transaction logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A curator NFT was minted.
    CuratorRegistered {
        /// Contract-assigned curator id (`cur_1`)
        unique_id: String,
        /// NFT token id
        token_id: U256,
    },
    /// A book NFT was minted.
    BookAdded {
        /// Contract-assigned book id
        unique_id: String,
        /// NFT token id
        token_id: U256,
    },
    /// A borrow request was recorded.
    BookRequestAdded {
        /// Request id
        id: U256,
    },
    /// A borrowing was created.
    BookBorrowed {
        /// Borrowing id
        borrowing_id: U256,
    },
}

impl DomainEvent {
    /// Shape this event was decoded from.
    pub fn shape(&self) -> EventShape {
        match self {
            DomainEvent::CuratorRegistered { .. } => EventShape::CuratorRegistered,
            DomainEvent::BookAdded { .. } => EventShape::BookAdded,
            DomainEvent::BookRequestAdded { .. } => EventShape::BookRequestAdded,
            DomainEvent::BookBorrowed { .. } => EventShape::BookBorrowed,
        }
    }
}
