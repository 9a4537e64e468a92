//! # LS-01 Chain Gateway
//!
//! Wallet sessions, error classification, event decoding and gas-buffered
//! contract calls against the Library-Share ledger contract.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn a typed [`TransactionIntent`] into a confirmed [`TransactionOutcome`]
//! or a classified error:
//! - Sessions are acquired per operation and re-validated before each call
//! - Raw provider faults never cross the gateway boundary unclassified
//! - Gas limits carry a fixed safety buffer over the estimate
//! - A broadcast transaction that never confirms is reported with its hash
//!
//! ## Error Taxonomy
//!
//! | Kind | Typical cause | User action |
//! |------|---------------|-------------|
//! | `WalletMissing` | No provider reachable | Install or unlock wallet |
//! | `UserRejected` | Prompt declined | Approve the prompt |
//! | `WrongNetwork` | Wallet on another chain | Switch network |
//! | `InsufficientFunds` | Balance below value + gas | Top up |
//! | `WalletDisconnected` | No account exposed | Reconnect |
//! | `NonceConflict` | Nonce reused | Wait, then retry |
//! | `GasUnderpriced` | Fee below base fee | Raise fee |
//! | `Unknown` | Anything else | Inspect diagnostic |
//!
//! ## Module Structure
//!
//! ```text
//! ls-01-chain-gateway/
//! ├── domain/          # Errors, intents, event registry, config
//! ├── algorithms/      # ABI codec, classifier, decoder, gas buffer
//! ├── ports/           # ChainGatewayApi, ChainProvider
//! ├── adapters/        # MockChainProvider, JsonRpcProvider (http)
//! └── service/         # WalletConnector, ContractGateway
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{MockChainProvider, ReceiptMode};
pub use algorithms::{
    buffered_gas_limit, classify, AbiError, DecodeError, EventDecoder,
    DEFAULT_GAS_BUFFER_PERCENT,
};
pub use domain::{
    CallStage, ConfigError, ContractBinding, ContractCall, DomainErrorKind, DomainEvent,
    EventShape, GatewayConfig, GatewayError, OperationKind, ParamType, RawChainError, RawLog,
    Token, TransactionIntent, TransactionOutcome, TransactionReceipt, TransactionRequest,
    DEFAULT_RECEIPT_MISS_LIMIT, REGISTRY_VERSION,
};
pub use ports::{ChainGatewayApi, ChainProvider};
pub use service::{ContractGateway, WalletConnector};

#[cfg(feature = "http")]
pub use adapters::JsonRpcProvider;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
