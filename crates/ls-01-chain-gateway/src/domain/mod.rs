//! # Domain Module
//!
//! Core domain types for the chain gateway.

pub mod abi;
pub mod config;
pub mod errors;
pub mod intent;
pub mod registry;

pub use abi::*;
pub use config::*;
pub use errors::*;
pub use intent::*;
pub use registry::*;
