//! # Service Layer
//!
//! Coordinator and incident sweep.

pub mod coordinator;
pub mod sweeper;

pub use coordinator::ReconciliationCoordinator;
pub use sweeper::{ReconciliationSweeper, SweepReport};
