//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Wallet**: `WalletSession`
//! - **Lifecycle**: `BorrowingStatus`
//! - **Mirror records**: `Curator`, `Book`, `BookRequest`, `BorrowingRecord`,
//!   `BorrowingLogEntry`

use crate::primitives::{Address, ChainId, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Off-chain record identifier.
pub type RecordId = Uuid;

// =============================================================================
// CLUSTER A: WALLET
// =============================================================================

/// A connected account bound to a network.
///
/// Acquired per top-level operation and never persisted: the wallet may
/// switch account or network underneath the application at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Selected account.
    pub address: Address,
    /// Network the wallet reported at acquisition time.
    pub chain_id: ChainId,
    /// False once the session has been observed stale.
    pub is_connected: bool,
}

impl WalletSession {
    /// Create a connected session.
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            address,
            chain_id,
            is_connected: true,
        }
    }
}

// =============================================================================
// CLUSTER B: BORROWING LIFECYCLE
// =============================================================================

/// Fulfillment status of a borrowing.
///
/// The declaration order is the canonical lifecycle order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BorrowingStatus {
    /// Curator is preparing the book.
    Preparing,
    /// Book handed to the carrier.
    Dispatched,
    /// Book received by the borrower.
    Delivered,
    /// Book back with the curator.
    Returned,
}

impl BorrowingStatus {
    /// Canonical lifecycle order.
    pub const ORDER: [BorrowingStatus; 4] = [
        BorrowingStatus::Preparing,
        BorrowingStatus::Dispatched,
        BorrowingStatus::Delivered,
        BorrowingStatus::Returned,
    ];

    /// Position in the canonical order, also the contract's enum value.
    pub fn code(&self) -> u8 {
        match self {
            BorrowingStatus::Preparing => 0,
            BorrowingStatus::Dispatched => 1,
            BorrowingStatus::Delivered => 2,
            BorrowingStatus::Returned => 3,
        }
    }

    /// Inverse of [`BorrowingStatus::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ORDER.get(code as usize).copied()
    }

    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Preparing => "preparing",
            BorrowingStatus::Dispatched => "dispatched",
            BorrowingStatus::Delivered => "delivered",
            BorrowingStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BorrowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preparing" => Ok(BorrowingStatus::Preparing),
            "dispatched" => Ok(BorrowingStatus::Dispatched),
            "delivered" => Ok(BorrowingStatus::Delivered),
            "returned" => Ok(BorrowingStatus::Returned),
            other => Err(format!("unknown borrowing status: {other}")),
        }
    }
}

// =============================================================================
// CLUSTER C: MIRROR RECORDS
// =============================================================================

/// Off-chain mirror of an on-chain curator NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curator {
    /// Record id.
    pub id: RecordId,
    /// Owning wallet (unique).
    pub wallet: Address,
    /// Display name.
    pub name: String,
    /// Protocol-assigned unique id from `CuratorRegistered`.
    pub on_chain_unique_id: String,
    /// NFT token id.
    pub token_id: U256,
    /// Registering transaction.
    pub transaction_hash: TxHash,
    /// First mirror write.
    pub created_at: DateTime<Utc>,
    /// Last mirror write.
    pub updated_at: DateTime<Utc>,
}

/// Off-chain mirror of an on-chain book NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Record id.
    pub id: RecordId,
    /// Curator wallet that listed the book.
    pub curator_wallet: Address,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Metadata location as submitted on-chain.
    pub metadata_uri: String,
    /// Protocol-assigned unique id from `BookAdded` (unique).
    pub on_chain_unique_id: String,
    /// NFT token id.
    pub token_id: U256,
    /// Listing transaction.
    pub transaction_hash: TxHash,
    /// First mirror write.
    pub created_at: DateTime<Utc>,
    /// Last mirror write.
    pub updated_at: DateTime<Utc>,
}

/// Off-chain mirror of a borrow request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRequest {
    /// Record id.
    pub id: RecordId,
    /// Id from `BookRequestAdded` (unique).
    pub on_chain_request_id: U256,
    /// Requested book.
    pub book_id: RecordId,
    /// Requesting wallet.
    pub requester_wallet: Address,
    /// Requested return date.
    pub return_date: DateTime<Utc>,
    /// Request transaction.
    pub transaction_hash: TxHash,
    /// Mirror write time.
    pub created_at: DateTime<Utc>,
}

/// Off-chain mirror of a borrowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingRecord {
    /// Record id.
    pub id: RecordId,
    /// Id from `BookBorrowed` (unique).
    pub on_chain_borrowing_id: U256,
    /// Borrowed book.
    pub book_id: RecordId,
    /// Borrower wallet.
    pub borrower_wallet: Address,
    /// Agreed start.
    pub borrow_date: DateTime<Utc>,
    /// Agreed return.
    pub return_date: DateTime<Utc>,
    /// Borrowing transaction.
    pub transaction_hash: TxHash,
    /// Mirror write time.
    pub created_at: DateTime<Utc>,
}

/// One entry in a borrowing's append-only status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingLogEntry {
    /// Record id.
    pub id: RecordId,
    /// Owning borrowing record.
    pub borrowing_id: RecordId,
    /// Status reached.
    pub status: BorrowingStatus,
    /// Optional note from the actor.
    pub message: Option<String>,
    /// Wallet that advanced the status.
    pub actor_wallet: Address,
    /// Append transaction.
    pub transaction_hash: TxHash,
    /// Creation time; log order is creation order.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_order() {
        for (i, status) in BorrowingStatus::ORDER.iter().enumerate() {
            assert_eq!(status.code() as usize, i);
            assert_eq!(BorrowingStatus::from_code(i as u8), Some(*status));
        }
        assert_eq!(BorrowingStatus::from_code(4), None);
    }

    #[test]
    fn test_status_text_roundtrip() {
        for status in BorrowingStatus::ORDER {
            assert_eq!(status.as_str().parse::<BorrowingStatus>().unwrap(), status);
        }
        assert!("lost".parse::<BorrowingStatus>().is_err());
    }

    #[test]
    fn test_wallet_session_connected() {
        let session = WalletSession::connected(Address::repeat_byte(1), ChainId(1));
        assert!(session.is_connected);
    }
}
