//! # LS-02 Reconciliation
//!
//! Keeps the on-chain ledger and the off-chain mirror consistent across
//! every state-changing domain operation.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Outcomes
//!
//! | Result | Chain | Mirror | Caller action |
//! |--------|-------|--------|---------------|
//! | `Ok(ReconciledWrite)` | Mutated | Written | None |
//! | `OnChain` / `Wallet` / `InvalidTransition` | Untouched | Untouched | Fix and retry |
//! | `OnChain(Unconfirmed)` | Maybe | Untouched | Wait for the sweep |
//! | `EventNotFound` | Mutated | Untouched | Reconcile by tx hash |
//! | `OffChainWriteFailed` | Mutated | Untouched | `retry_off_chain` |
//!
//! ## Borrowing Lifecycle
//!
//! ```text
//! Preparing ──→ Dispatched ──→ Delivered ──→ Returned (terminal)
//! ```
//!
//! Appends are validated before either store is touched. The mirror's
//! `(borrowing_id, status)` uniqueness rejects a concurrent loser.
//!
//! ## Module Structure
//!
//! ```text
//! ls-02-reconciliation/
//! ├── domain/          # Operations, protocol ids, incidents, errors, config
//! ├── algorithms/      # Lifecycle state machine, mirror row construction
//! ├── ports/           # ReconciliationApi, MirrorStore, IncidentJournal
//! ├── adapters/        # In-memory store and journal, SQLite (sqlite)
//! └── service/         # ReconciliationCoordinator, ReconciliationSweeper
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryIncidentJournal, InMemoryMirrorStore};
pub use algorithms::{
    build_mirror, is_terminal, next_status, validate_append, validate_log, MirrorRecord,
};
pub use domain::{
    ChainFact, DomainOperation, IncidentKind, InvalidTransition, ProtocolId, ReconciledWrite,
    ReconciliationConfig, ReconciliationError, ReconciliationIncident, ServiceConfig,
    ServiceConfigError, StoreError,
};
pub use ports::{IncidentJournal, MirrorStore, ReconciliationApi};
pub use service::{ReconciliationCoordinator, ReconciliationSweeper, SweepReport};

#[cfg(feature = "sqlite")]
pub use adapters::SqliteMirrorStore;
