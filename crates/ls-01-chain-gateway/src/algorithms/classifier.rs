//! # Error Classifier
//!
//! Maps any raw wallet, transport or chain fault to a [`DomainErrorKind`].
//!
//! Two tiers, tried in order:
//!
//! 1. Structured fields: EIP-1193 provider codes and the symbolic codes
//!    client libraries attach.
//! 2. Case-insensitive substring matching over the message and data payload.
//!    Kinds are tried in priority order and the first hit wins.
//!
//! The substring tier is best-effort and tracks provider wording; every
//! pattern below must have a test.
//!
//! `classify` is total: anything unrecognized becomes
//! [`DomainErrorKind::Unknown`] with a truncated diagnostic.

use crate::domain::{DomainErrorKind, RawChainError};

/// Maximum characters of the raw message kept in `Unknown`.
pub const MAX_DIAGNOSTIC_CHARS: usize = 120;

/// EIP-1193: user rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193: method or account not authorized.
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// EIP-1193: provider disconnected from all chains.
pub const CODE_DISCONNECTED: i64 = 4900;
/// EIP-1193: provider not connected to the requested chain.
pub const CODE_CHAIN_DISCONNECTED: i64 = 4901;
/// `wallet_switchEthereumChain`: chain not added to the wallet.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Messages meaning no wallet provider is present.
pub const WALLET_MISSING_PATTERNS: &[&str] = &[
    "no wallet",
    "wallet not found",
    "no ethereum provider",
    "provider not found",
    "window.ethereum is undefined",
    "metamask not installed",
];

/// Messages meaning the user declined a prompt.
pub const USER_REJECTED_PATTERNS: &[&str] = &[
    "user rejected",
    "user denied",
    "user cancelled",
    "user canceled",
    "rejected by user",
    "action_rejected",
];

/// Messages meaning the wallet is on another network.
pub const WRONG_NETWORK_PATTERNS: &[&str] = &[
    "wrong network",
    "unsupported chain",
    "unrecognized chain",
    "chain mismatch",
    "network changed",
    "invalid chain id",
];

/// Messages meaning the account cannot pay.
pub const INSUFFICIENT_FUNDS_PATTERNS: &[&str] = &[
    "insufficient funds",
    "insufficient balance",
    "exceeds balance",
];

/// Messages meaning no account is exposed.
pub const WALLET_DISCONNECTED_PATTERNS: &[&str] = &[
    "disconnected",
    "not connected",
    "no accounts",
    "account locked",
    "wallet is locked",
];

/// Messages meaning the nonce collides with another transaction.
pub const NONCE_CONFLICT_PATTERNS: &[&str] = &[
    "nonce too low",
    "nonce too high",
    "nonce has already been used",
    "nonce expired",
    "already known",
];

/// Messages meaning the fee is too low.
pub const GAS_UNDERPRICED_PATTERNS: &[&str] = &[
    "replacement transaction underpriced",
    "transaction underpriced",
    "max fee per gas less than block base fee",
    "gas price too low",
    "fee too low",
    "underpriced",
];

#[derive(Clone, Copy)]
enum KnownKind {
    WalletMissing,
    UserRejected,
    WrongNetwork,
    InsufficientFunds,
    WalletDisconnected,
    NonceConflict,
    GasUnderpriced,
}

impl KnownKind {
    fn into_kind(self) -> DomainErrorKind {
        match self {
            KnownKind::WalletMissing => DomainErrorKind::WalletMissing,
            KnownKind::UserRejected => DomainErrorKind::UserRejected,
            KnownKind::WrongNetwork => DomainErrorKind::WrongNetwork,
            KnownKind::InsufficientFunds => DomainErrorKind::InsufficientFunds,
            KnownKind::WalletDisconnected => DomainErrorKind::WalletDisconnected,
            KnownKind::NonceConflict => DomainErrorKind::NonceConflict,
            KnownKind::GasUnderpriced => DomainErrorKind::GasUnderpriced,
        }
    }
}

/// Substring tier in priority order.
const PRIORITY: [(KnownKind, &[&str]); 7] = [
    (KnownKind::WalletMissing, WALLET_MISSING_PATTERNS),
    (KnownKind::UserRejected, USER_REJECTED_PATTERNS),
    (KnownKind::WrongNetwork, WRONG_NETWORK_PATTERNS),
    (KnownKind::InsufficientFunds, INSUFFICIENT_FUNDS_PATTERNS),
    (KnownKind::WalletDisconnected, WALLET_DISCONNECTED_PATTERNS),
    (KnownKind::NonceConflict, NONCE_CONFLICT_PATTERNS),
    (KnownKind::GasUnderpriced, GAS_UNDERPRICED_PATTERNS),
];

fn classify_structured(raw: &RawChainError) -> Option<KnownKind> {
    match raw.code {
        Some(CODE_USER_REJECTED) => return Some(KnownKind::UserRejected),
        Some(CODE_UNRECOGNIZED_CHAIN) => return Some(KnownKind::WrongNetwork),
        Some(CODE_UNAUTHORIZED | CODE_DISCONNECTED | CODE_CHAIN_DISCONNECTED) => {
            return Some(KnownKind::WalletDisconnected)
        }
        _ => {}
    }

    match raw.symbol.as_deref()?.to_ascii_uppercase().as_str() {
        "ACTION_REJECTED" => Some(KnownKind::UserRejected),
        "INSUFFICIENT_FUNDS" => Some(KnownKind::InsufficientFunds),
        "NONCE_EXPIRED" => Some(KnownKind::NonceConflict),
        "REPLACEMENT_UNDERPRICED" => Some(KnownKind::GasUnderpriced),
        "NETWORK_ERROR" => Some(KnownKind::WrongNetwork),
        _ => None,
    }
}

fn classify_text(raw: &RawChainError) -> Option<KnownKind> {
    let mut haystack = raw.message.to_lowercase();
    if let Some(data) = &raw.data {
        haystack.push(' ');
        haystack.push_str(&data.to_lowercase());
    }

    PRIORITY
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| haystack.contains(p)))
        .map(|(kind, _)| *kind)
}

fn truncate(message: &str) -> String {
    if message.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return message.to_string();
    }
    let mut out: String = message.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
    out.push_str("...");
    out
}

/// Classify a raw fault. Never fails.
pub fn classify(raw: &RawChainError) -> DomainErrorKind {
    if let Some(kind) = classify_structured(raw).or_else(|| classify_text(raw)) {
        return kind.into_kind();
    }

    DomainErrorKind::Unknown {
        message: truncate(raw.message.trim()),
    }
}
