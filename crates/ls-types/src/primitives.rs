//! # Chain Primitives
//!
//! Address, hash and chain-id types plus the hex helpers used to move them
//! in and out of text columns and JSON-RPC payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Re-export from primitive-types for use across all subsystems
pub use primitive_types::{H160, H256, U256};

/// A 20-byte account or contract address.
pub type Address = H160;

/// A 32-byte transaction hash.
pub type TxHash = H256;

/// EVM network identifier (EIP-155).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex form used by `wallet_switchEthereumChain`.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse a `0x`-prefixed hex quantity as returned by `eth_chainId`.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        parse_quantity(s).map(ChainId)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Hex parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// Input is not valid hex.
    #[error("invalid hex: {0}")]
    Invalid(String),

    /// Decoded bytes have the wrong length.
    #[error("expected {expected} bytes, got {got}")]
    Length {
        /// Required byte length
        expected: usize,
        /// Actual byte length
        got: usize,
    },
}

fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let bytes = hex::decode(strip_prefix(s)).map_err(|e| HexError::Invalid(e.to_string()))?;
    if bytes.len() != N {
        return Err(HexError::Length {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a `0x`-prefixed 20-byte address.
pub fn parse_address(s: &str) -> Result<Address, HexError> {
    decode_fixed::<20>(s).map(H160)
}

/// Parse a `0x`-prefixed 32-byte hash.
pub fn parse_hash(s: &str) -> Result<TxHash, HexError> {
    decode_fixed::<32>(s).map(H256)
}

/// Parse a JSON-RPC hex quantity (`0x1a`).
pub fn parse_quantity(s: &str) -> Result<u64, HexError> {
    let digits = strip_prefix(s);
    if digits.is_empty() {
        return Err(HexError::Invalid(s.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|e| HexError::Invalid(e.to_string()))
}

/// Full lowercase `0x` form of an address.
pub fn address_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Full lowercase `0x` form of a hash.
pub fn hash_hex(hash: &TxHash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
