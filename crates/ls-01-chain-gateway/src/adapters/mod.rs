//! # Adapters
//!
//! Implementations of the chain provider port.

pub mod mock_provider;

#[cfg(feature = "http")]
pub mod json_rpc;

pub use mock_provider::{MockChainProvider, ReceiptMode};

#[cfg(feature = "http")]
pub use json_rpc::JsonRpcProvider;
