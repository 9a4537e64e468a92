//! Reconciliation and service configuration.
//!
//! ```toml
//! store_path = "/var/lib/ls/mirror.db"
//! rpc_url = "http://127.0.0.1:8545"
//!
//! [gateway]
//! required_chain_id = 11155111
//! contract_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
//! gas_buffer_percent = 120
//!
//! [reconciliation]
//! max_sweep_batch = 50
//! max_incident_attempts = 5
//! ```

use ls_01_chain_gateway::{ConfigError, GatewayConfig};
use ls_types::{parse_address, ChainId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Sweep limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Incidents examined per sweep
    pub max_sweep_batch: usize,
    /// Attempts after which an incident is left for an operator
    pub max_incident_attempts: u32,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            max_sweep_batch: 50,
            max_incident_attempts: 5,
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Chain gateway
    pub gateway: GatewayConfig,
    /// Reconciliation sweep
    pub reconciliation: ReconciliationConfig,
    /// Mirror database file
    pub store_path: String,
    /// JSON-RPC endpoint
    pub rpc_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            reconciliation: ReconciliationConfig::default(),
            store_path: "ls-mirror.db".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
        }
    }
}

/// Service configuration errors
#[derive(Debug, Error)]
pub enum ServiceConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// I/O error
        message: String,
    },
    /// TOML did not parse
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// An environment override is malformed
    #[error("invalid value for {var}: {message}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Parse error
        message: String,
    },
    /// Gateway section invalid
    #[error(transparent)]
    Gateway(#[from] ConfigError),
    /// Other invalid values
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ServiceConfig {
    /// Parse TOML.
    pub fn parse(content: &str) -> Result<Self, ServiceConfigError> {
        toml::from_str(content).map_err(|e| ServiceConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ServiceConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ServiceConfigError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Defaults with environment overrides.
    pub fn from_env() -> Result<Self, ServiceConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `LS_CHAIN_ID`: required chain id (decimal or `0x` hex)
    /// - `LS_CONTRACT_ADDRESS`: ledger contract address
    /// - `LS_RPC_URL`: JSON-RPC endpoint
    /// - `LS_STORE_PATH`: mirror database file
    /// - `LS_GAS_BUFFER_PERCENT`: gas buffer percentage
    /// - `LS_RECEIPT_MISS_LIMIT`: unknown-transaction polls before a drop
    pub fn apply_env(&mut self) -> Result<(), ServiceConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ServiceConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("LS_CHAIN_ID") {
            let parsed = if raw.starts_with("0x") {
                ChainId::from_hex(&raw).map_err(|e| e.to_string())
            } else {
                raw.parse::<u64>().map(ChainId).map_err(|e| e.to_string())
            };
            self.gateway.required_chain_id = parsed.map_err(|message| ServiceConfigError::Env {
                var: "LS_CHAIN_ID",
                message,
            })?;
        }
        if let Some(raw) = lookup("LS_CONTRACT_ADDRESS") {
            self.gateway.contract_address =
                parse_address(&raw).map_err(|e| ServiceConfigError::Env {
                    var: "LS_CONTRACT_ADDRESS",
                    message: e.to_string(),
                })?;
        }
        if let Some(raw) = lookup("LS_GAS_BUFFER_PERCENT") {
            self.gateway.gas_buffer_percent =
                raw.parse().map_err(|e: std::num::ParseIntError| ServiceConfigError::Env {
                    var: "LS_GAS_BUFFER_PERCENT",
                    message: e.to_string(),
                })?;
        }
        if let Some(raw) = lookup("LS_RECEIPT_MISS_LIMIT") {
            self.gateway.receipt_miss_limit =
                raw.parse().map_err(|e: std::num::ParseIntError| ServiceConfigError::Env {
                    var: "LS_RECEIPT_MISS_LIMIT",
                    message: e.to_string(),
                })?;
        }
        if let Some(raw) = lookup("LS_RPC_URL") {
            self.rpc_url = raw;
        }
        if let Some(raw) = lookup("LS_STORE_PATH") {
            self.store_path = raw;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ServiceConfigError> {
        self.gateway.validate()?;

        if self.reconciliation.max_sweep_batch == 0 {
            return Err(ServiceConfigError::Invalid(
                "max_sweep_batch cannot be 0".into(),
            ));
        }
        if self.reconciliation.max_incident_attempts == 0 {
            return Err(ServiceConfigError::Invalid(
                "max_incident_attempts cannot be 0".into(),
            ));
        }
        if self.rpc_url.is_empty() {
            return Err(ServiceConfigError::Invalid("rpc_url cannot be empty".into()));
        }
        Ok(())
    }
}
