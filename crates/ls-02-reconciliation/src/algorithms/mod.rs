//! # Algorithms
//!
//! Borrowing lifecycle rules and mirror record construction.

pub mod lifecycle;
pub mod mirror;

pub use lifecycle::{is_terminal, next_status, validate_append, validate_log};
pub use mirror::{build_mirror, MirrorRecord};
