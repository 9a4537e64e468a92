//! # Event Decoder
//!
//! Scans a transaction's logs for the first one matching an expected
//! [`EventShape`].
//!
//! A log that does not parse against the shape is skipped: the same call
//! may emit unrelated events (ERC-721 `Transfer`, for one). Only the absence
//! of any match across the whole log set is reported.

use super::abi::decode;
use crate::domain::{DomainEvent, EventShape, RawLog, TransactionOutcome};
use ls_types::{hash_hex, Address, TxHash};
use thiserror::Error;
use tracing::{debug, trace};

/// Decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Outcome has no receipt; nothing to decode
    #[error("transaction {} has no confirmed receipt", hash_hex(.tx_hash))]
    Unconfirmed {
        /// Transaction
        tx_hash: TxHash,
    },

    /// No log matched the expected shape
    #[error("no {shape} event in {logs_scanned} logs of transaction {}", hash_hex(.tx_hash))]
    EventNotFound {
        /// Transaction
        tx_hash: TxHash,
        /// Expected shape
        shape: EventShape,
        /// Logs examined
        logs_scanned: usize,
    },
}

/// Decodes ledger events from transaction outcomes.
#[derive(Clone, Debug, Default)]
pub struct EventDecoder {
    emitter: Option<Address>,
}

impl EventDecoder {
    /// Accept matching logs from any contract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept logs emitted by `address`.
    pub fn for_contract(address: Address) -> Self {
        Self {
            emitter: Some(address),
        }
    }

    /// Try one log against `shape`.
    pub fn decode_log(&self, log: &RawLog, shape: EventShape) -> Option<DomainEvent> {
        if let Some(emitter) = self.emitter {
            if log.address != emitter {
                return None;
            }
        }
        if log.topics.first() != Some(&shape.topic()) {
            return None;
        }
        match decode(shape.params(), &log.data) {
            Ok(tokens) => shape.build(tokens),
            Err(e) => {
                trace!(shape = %shape, error = %e, "Skipping malformed log");
                None
            }
        }
    }

    /// First event of `shape` in `outcome`.
    pub fn decode(
        &self,
        outcome: &TransactionOutcome,
        shape: EventShape,
    ) -> Result<DomainEvent, DecodeError> {
        if !outcome.block_confirmed {
            return Err(DecodeError::Unconfirmed {
                tx_hash: outcome.hash,
            });
        }

        if let Some(event) = outcome
            .raw_logs
            .iter()
            .find_map(|log| self.decode_log(log, shape))
        {
            debug!(tx_hash = %hash_hex(&outcome.hash), event = ?event, "Decoded event");
            return Ok(event);
        }

        Err(DecodeError::EventNotFound {
            tx_hash: outcome.hash,
            shape,
            logs_scanned: outcome.raw_logs.len(),
        })
    }
}
