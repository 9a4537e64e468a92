//! # Borrowing Lifecycle
//!
//! Pure state machine over `Preparing → Dispatched → Delivered → Returned`.
//!
//! A borrowing's log is append-only and its status set must always be a
//! prefix of the canonical order. [`validate_append`] is the single check
//! both the on-chain append and the mirror write go through.

use crate::domain::InvalidTransition;
use ls_types::{BorrowingLogEntry, BorrowingStatus};

fn contains(log: &[BorrowingLogEntry], status: BorrowingStatus) -> bool {
    log.iter().any(|entry| entry.status == status)
}

/// First canonical status not yet in `log`, or `None` when all four are.
pub fn next_status(log: &[BorrowingLogEntry]) -> Option<BorrowingStatus> {
    BorrowingStatus::ORDER
        .into_iter()
        .find(|status| !contains(log, *status))
}

/// True iff every canonical status is present.
///
/// Set membership only; entry order does not matter here.
pub fn is_terminal(log: &[BorrowingLogEntry]) -> bool {
    BorrowingStatus::ORDER
        .into_iter()
        .all(|status| contains(log, status))
}

/// Accept `candidate` only if it is exactly the next status.
pub fn validate_append(
    log: &[BorrowingLogEntry],
    candidate: BorrowingStatus,
) -> Result<(), InvalidTransition> {
    let expected = next_status(log);
    if expected == Some(candidate) {
        Ok(())
    } else {
        Err(InvalidTransition {
            expected,
            got: candidate,
        })
    }
}

/// Check a whole log: creation order must follow the canonical order with
/// no repeats.
pub fn validate_log(log: &[BorrowingLogEntry]) -> Result<(), InvalidTransition> {
    for (i, entry) in log.iter().enumerate() {
        validate_append(&log[..i], entry.status)?;
    }
    Ok(())
}
