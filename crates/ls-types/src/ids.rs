//! Deterministic off-chain record ids.
//!
//! Ids are UUID v5 over the record's natural key. Two writes of the same
//! chain fact therefore agree on the id even when the first one never
//! reached the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for all Library-Share mirror ids.
const MIRROR_NAMESPACE: Uuid = Uuid::from_u128(0x6c73_2d6c_6564_6765_7200_0000_0000_0001);

/// Mirror record families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Curator keyed by on-chain unique id.
    Curator,
    /// Book keyed by on-chain unique id.
    Book,
    /// Book request keyed by on-chain request id.
    BookRequest,
    /// Borrowing keyed by on-chain borrowing id.
    Borrowing,
    /// Log entry keyed by (borrowing id, status).
    BorrowingLog,
}

impl RecordKind {
    fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Curator => "curator",
            RecordKind::Book => "book",
            RecordKind::BookRequest => "book-request",
            RecordKind::Borrowing => "borrowing",
            RecordKind::BorrowingLog => "borrowing-log",
        }
    }
}

/// Derive the record id for `natural_key` within `kind`.
pub fn record_id(kind: RecordKind, natural_key: &str) -> Uuid {
    let name = format!("{}:{}", kind.prefix(), natural_key);
    Uuid::new_v5(&MIRROR_NAMESPACE, name.as_bytes())
}
