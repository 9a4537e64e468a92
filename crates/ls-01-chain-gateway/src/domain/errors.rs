//! # Domain Errors
//!
//! Raw provider faults, the classified domain error kinds surfaced to
//! callers, and the gateway's own failure modes.

use ls_types::{hash_hex, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fault exactly as reported by the wallet, the RPC transport, or the chain.
///
/// Never shown to users; [`crate::classify`] turns it into a
/// [`DomainErrorKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChainError {
    /// Numeric code (EIP-1193 provider codes or JSON-RPC codes).
    pub code: Option<i64>,
    /// Symbolic code some client libraries attach (`ACTION_REJECTED`).
    pub symbol: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Extra payload, often a nested provider message.
    pub data: Option<String>,
}

impl RawChainError {
    /// Error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Error with a numeric code.
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attach a symbolic code.
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Attach a data payload.
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

impl fmt::Display for RawChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Classified, user-actionable error kinds.
///
/// Every kind is recoverable by user action: fix the condition, then retry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DomainErrorKind {
    /// No wallet provider is reachable.
    #[error("No wallet detected. Install or unlock a wallet, then retry.")]
    WalletMissing,

    /// The user declined a signature or approval prompt.
    #[error("The request was rejected in the wallet. Approve it to continue.")]
    UserRejected,

    /// The wallet is bound to a different network.
    #[error("The wallet is on the wrong network. Switch to the required network and retry.")]
    WrongNetwork,

    /// Balance cannot cover value plus gas.
    #[error("Insufficient funds for gas and value. Top up the account and retry.")]
    InsufficientFunds,

    /// No account is exposed, or the bound account changed.
    #[error("The wallet is disconnected. Reconnect it and retry.")]
    WalletDisconnected,

    /// A pending or mined transaction already uses this nonce.
    #[error("Nonce conflict with another transaction. Wait for it to confirm, then retry.")]
    NonceConflict,

    /// Fee is below what the network currently accepts.
    #[error("Gas price too low for the network. Retry with a higher fee.")]
    GasUnderpriced,

    /// Anything else. The message is a truncated diagnostic.
    #[error("Unexpected wallet error: {message}")]
    Unknown {
        /// Truncated diagnostic, never the full raw error.
        message: String,
    },
}

impl DomainErrorKind {
    /// Stable discriminant for logs, metrics and transport framing.
    pub fn label(&self) -> &'static str {
        match self {
            DomainErrorKind::WalletMissing => "wallet_missing",
            DomainErrorKind::UserRejected => "user_rejected",
            DomainErrorKind::WrongNetwork => "wrong_network",
            DomainErrorKind::InsufficientFunds => "insufficient_funds",
            DomainErrorKind::WalletDisconnected => "wallet_disconnected",
            DomainErrorKind::NonceConflict => "nonce_conflict",
            DomainErrorKind::GasUnderpriced => "gas_underpriced",
            DomainErrorKind::Unknown { .. } => "unknown",
        }
    }
}

/// Step of a contract call at which a classified fault occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStage {
    /// Re-validating the wallet session.
    Session,
    /// `eth_estimateGas`.
    EstimateGas,
    /// `eth_sendTransaction`.
    Submit,
    /// Receipt lookup for an earlier transaction.
    Receipt,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStage::Session => f.write_str("session check"),
            CallStage::EstimateGas => f.write_str("gas estimation"),
            CallStage::Submit => f.write_str("submission"),
            CallStage::Receipt => f.write_str("receipt lookup"),
        }
    }
}

/// Contract call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Nothing was broadcast, or the broadcast itself was refused.
    #[error("{stage} failed: {kind}")]
    Rejected {
        /// Where it failed
        stage: CallStage,
        /// Classified cause
        kind: DomainErrorKind,
    },

    /// Broadcast but no receipt: dropped, replaced, or still pending when
    /// the wait gave up. The transaction may still mine.
    #[error("transaction {} was not confirmed", hash_hex(.tx_hash))]
    Unconfirmed {
        /// Broadcast transaction
        tx_hash: TxHash,
    },

    /// Mined with a failed status. No contract state changed.
    #[error("transaction {} reverted", hash_hex(.tx_hash))]
    Reverted {
        /// Mined transaction
        tx_hash: TxHash,
    },
}

impl GatewayError {
    /// Classified kind, when the failure came from the wallet or provider.
    pub fn kind(&self) -> Option<&DomainErrorKind> {
        match self {
            GatewayError::Rejected { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Hash of the broadcast transaction, if one exists.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            GatewayError::Rejected { .. } => None,
            GatewayError::Unconfirmed { tx_hash } | GatewayError::Reverted { tx_hash } => {
                Some(*tx_hash)
            }
        }
    }

    /// Stable discriminant for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GatewayError::Rejected { kind, .. } => kind.label(),
            GatewayError::Unconfirmed { .. } => "unconfirmed",
            GatewayError::Reverted { .. } => "reverted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_error_display_includes_code() {
        let err = RawChainError::with_code(4001, "User rejected the request.");
        assert_eq!(err.to_string(), "[4001] User rejected the request.");
    }

    #[test]
    fn test_unknown_kind_carries_message() {
        let kind = DomainErrorKind::Unknown {
            message: "boom".to_string(),
        };
        assert!(kind.to_string().contains("boom"));
        assert_eq!(kind.label(), "unknown");
    }

    #[test]
    fn test_gateway_error_tx_hash() {
        let tx_hash = TxHash::from_low_u64_be(0xabc);
        assert_eq!(
            GatewayError::Unconfirmed { tx_hash }.tx_hash(),
            Some(tx_hash)
        );
        let rejected = GatewayError::Rejected {
            stage: CallStage::Submit,
            kind: DomainErrorKind::UserRejected,
        };
        assert_eq!(rejected.tx_hash(), None);
        assert_eq!(rejected.kind(), Some(&DomainErrorKind::UserRejected));
        assert!(rejected.to_string().starts_with("submission failed"));
    }
}
