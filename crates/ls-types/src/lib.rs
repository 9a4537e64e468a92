//! # Library-Share Types
//!
//! Entities shared across the ledger subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: mirror record shapes are defined once, here.
//! - **Chain Linkage**: every mirror record carries the protocol identifier
//!   and the transaction hash that produced it.
//! - **Deterministic Identity**: off-chain record ids are derived from the
//!   natural key, so a retried write lands on the same row.

pub mod entities;
pub mod ids;
pub mod primitives;

pub use entities::*;
pub use ids::{record_id, RecordKind};
pub use primitives::*;
