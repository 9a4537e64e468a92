//! # Library-Share Ledger Test Suite
//!
//! Cross-crate flows driving the reconciliation coordinator through the
//! real contract gateway over a scripted chain provider.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Harness, event log builders
//!     ├── flows.rs          # Happy paths and lifecycle walks
//!     ├── failure_modes.rs  # Partial failures, retries, incidents
//!     └── sqlite_flows.rs   # Same contracts against the SQLite store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ls-tests
//! cargo test -p ls-tests integration::failure_modes::
//! ```

#![allow(dead_code)]

pub mod integration;
