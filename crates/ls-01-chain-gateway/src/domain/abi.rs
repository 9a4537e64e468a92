//! ABI value objects shared by call encoding and event decoding.

use ls_types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Solidity parameter types used by the ledger contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// `uint256` (also carries `uint8` enum values, zero-extended)
    Uint,
    /// `address`
    Address,
    /// dynamic `string`
    String,
}

impl ParamType {
    /// Dynamic types are encoded in the tail with an offset in the head.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::String)
    }
}

/// A decoded or to-be-encoded ABI value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    /// Unsigned integer
    Uint(U256),
    /// 20-byte address
    Address(Address),
    /// UTF-8 string
    String(String),
}

impl Token {
    /// Parameter type of this token.
    pub fn param_type(&self) -> ParamType {
        match self {
            Token::Uint(_) => ParamType::Uint,
            Token::Address(_) => ParamType::Address,
            Token::String(_) => ParamType::String,
        }
    }

    /// Integer value, if this is a `Uint`.
    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(v),
            _ => None,
        }
    }

    /// String value, if this is a `String`.
    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<U256> for Token {
    fn from(v: U256) -> Self {
        Token::Uint(v)
    }
}

impl From<u64> for Token {
    fn from(v: u64) -> Self {
        Token::Uint(U256::from(v))
    }
}

impl From<Address> for Token {
    fn from(a: Address) -> Self {
        Token::Address(a)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::String(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token::String(s)
    }
}
