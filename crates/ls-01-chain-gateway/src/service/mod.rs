//! # Service Layer
//!
//! Wallet session acquisition and the contract gateway.

pub mod gateway;
pub mod wallet;

pub use gateway::ContractGateway;
pub use wallet::WalletConnector;
