//! # Contract ABI Codec
//!
//! Head/tail encoding for the subset of Solidity types the ledger contract
//! uses: `uint256`, `address` and `string`.
//!
//! Decoding is bounds-checked. Malformed data yields [`AbiError`] and never
//! panics, because log data comes from the chain and is untrusted.

use crate::domain::{ParamType, Token};
use ls_types::{Address, H256, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// ABI word size.
pub const WORD: usize = 32;

/// ABI decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// A read ran past the end of the data
    #[error("read of {len} bytes at offset {offset} exceeds data length {available}")]
    OutOfBounds {
        /// Read start
        offset: usize,
        /// Read length
        len: usize,
        /// Data length
        available: usize,
    },
    /// String bytes are not UTF-8
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// An offset or length does not fit in memory
    #[error("offset or length overflows")]
    Overflow,
    /// Non-zero bytes in the padding of a static value
    #[error("invalid padding for {0:?}")]
    InvalidPadding(ParamType),
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> H256 {
    H256(Keccak256::digest(data).into())
}

/// Function selector: the first four bytes of the signature hash.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

/// Event topic: the full signature hash.
pub fn event_topic(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}

fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encode `tokens` as an ABI tuple.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            Token::Address(a) => head.extend_from_slice(&address_word(a)),
            Token::String(s) => {
                let offset = head_len + tail.len();
                head.extend_from_slice(&uint_word(U256::from(offset)));

                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(U256::from(bytes.len())));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encode a call: selector followed by the argument tuple.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode(tokens));
    data
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(len).ok_or(AbiError::Overflow)?;
    data.get(offset..end).ok_or(AbiError::OutOfBounds {
        offset,
        len,
        available: data.len(),
    })
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    slice(data, offset, WORD)
}

fn word_to_usize(word: &[u8]) -> Result<usize, AbiError> {
    let value = U256::from_big_endian(word);
    if value.bits() > 64 {
        return Err(AbiError::Overflow);
    }
    usize::try_from(value.low_u64()).map_err(|_| AbiError::Overflow)
}

/// Decode an ABI tuple of `params` from `data`.
pub fn decode(params: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(params.len());

    for (i, param) in params.iter().enumerate() {
        let word = read_word(data, i * WORD)?;
        let token = match param {
            ParamType::Uint => Token::Uint(U256::from_big_endian(word)),
            ParamType::Address => {
                if word[..12].iter().any(|b| *b != 0) {
                    return Err(AbiError::InvalidPadding(*param));
                }
                Token::Address(Address::from_slice(&word[12..]))
            }
            ParamType::String => {
                let offset = word_to_usize(word)?;
                let len = word_to_usize(read_word(data, offset)?)?;
                let start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
                let bytes = slice(data, start, len)?;
                let s = std::str::from_utf8(bytes).map_err(|_| AbiError::InvalidUtf8)?;
                Token::String(s.to_string())
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}
