//! # Domain Module
//!
//! Operations, protocol identifiers, incidents, errors and configuration.

pub mod config;
pub mod errors;
pub mod incident;
pub mod operation;

pub use config::*;
pub use errors::*;
pub use incident::*;
pub use operation::*;
