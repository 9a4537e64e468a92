//! # Algorithms
//!
//! Pure logic: ABI codec, error classification, gas buffering and event
//! decoding.

pub mod abi;
pub mod classifier;
pub mod decoder;
pub mod gas;

pub use abi::{decode, encode, encode_call, event_topic, keccak256, selector, AbiError};
pub use classifier::classify;
pub use decoder::{DecodeError, EventDecoder};
pub use gas::{buffered_gas_limit, DEFAULT_GAS_BUFFER_PERCENT};
