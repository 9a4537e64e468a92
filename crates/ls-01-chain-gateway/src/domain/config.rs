//! Gateway configuration with validation.

use super::intent::ContractBinding;
use ls_types::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Consecutive receipt polls where the node knows nothing of a broadcast
/// transaction before it counts as dropped.
pub const DEFAULT_RECEIPT_MISS_LIMIT: u32 = 10;

/// Chain gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Network the gateway refuses to leave
    pub required_chain_id: ChainId,
    /// Deployed ledger contract
    pub contract_address: Address,
    /// Gas limit as a percentage of the estimate
    pub gas_buffer_percent: u64,
    /// Times to probe for the wallet before giving up
    pub wallet_poll_attempts: u32,
    /// Delay between probes
    pub wallet_poll_interval_ms: u64,
    /// Upper bound on the receipt wait
    pub confirmation_timeout_ms: u64,
    /// Delay between receipt polls against a JSON-RPC node
    pub receipt_poll_interval_ms: u64,
    /// Unknown-transaction polls before a broadcast counts as dropped
    pub receipt_miss_limit: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            required_chain_id: ChainId(11_155_111),
            contract_address: Address::zero(),
            gas_buffer_percent: 120,
            wallet_poll_attempts: 10,
            wallet_poll_interval_ms: 100,
            confirmation_timeout_ms: 120_000,
            receipt_poll_interval_ms: 2_000,
            receipt_miss_limit: DEFAULT_RECEIPT_MISS_LIMIT,
        }
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gas_buffer_percent < 100 {
            return Err(ConfigError::InvalidGasBuffer(self.gas_buffer_percent));
        }

        if self.wallet_poll_attempts == 0 {
            return Err(ConfigError::InvalidLimit(
                "wallet_poll_attempts cannot be 0".into(),
            ));
        }

        if self.receipt_miss_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "receipt_miss_limit cannot be 0".into(),
            ));
        }

        if self.confirmation_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "confirmation_timeout_ms cannot be 0".into(),
            ));
        }

        if self.contract_address.is_zero() {
            return Err(ConfigError::MissingContract);
        }

        Ok(())
    }

    /// Binding for the configured contract.
    pub fn contract(&self) -> ContractBinding {
        ContractBinding::new("library-share-ledger", self.contract_address)
    }

    /// Delay between wallet probes.
    pub fn wallet_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wallet_poll_interval_ms)
    }

    /// Delay between receipt polls.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// Receipt wait bound.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Buffer would cap gas below the estimate
    #[error("gas buffer must be at least 100%, got {0}%")]
    InvalidGasBuffer(u64),
    /// Invalid count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// No contract address configured
    #[error("contract address is not configured")]
    MissingContract,
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
