//! # Transaction Intents and Outcomes
//!
//! A [`TransactionIntent`] is built once per call and consumed by the
//! gateway. A [`TransactionOutcome`] is produced once per submitted intent.

use super::abi::Token;
use super::registry::OperationKind;
use crate::algorithms::abi::encode_call;
use ls_types::{Address, BorrowingStatus, TxHash, H256, U256};
use serde::{Deserialize, Serialize};

/// Deployed contract the gateway talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBinding {
    /// Human name for logs.
    pub name: String,
    /// Deployed address.
    pub address: Address,
}

impl ContractBinding {
    /// Bind to `address`.
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Contract methods with their typed arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    /// `registerCurator(name, metadataUri)`
    RegisterCurator {
        /// Display name
        name: String,
        /// Metadata location
        metadata_uri: String,
    },
    /// `addBook(title, author, metadataUri)`
    AddBook {
        /// Title
        title: String,
        /// Author
        author: String,
        /// Metadata location
        metadata_uri: String,
    },
    /// `addBookRequest(bookTokenId, returnDate)`
    AddBookRequest {
        /// Book NFT token id
        book_token_id: U256,
        /// Requested return date, unix seconds
        return_date: u64,
    },
    /// `borrowBook(requestId, borrowDate, returnDate)`
    BorrowBook {
        /// On-chain request id
        request_id: U256,
        /// Unix seconds
        borrow_date: u64,
        /// Unix seconds
        return_date: u64,
    },
    /// `addBorrowingLog(borrowingId, status, message)`
    AddBorrowingLog {
        /// On-chain borrowing id
        borrowing_id: U256,
        /// Status being appended
        status: BorrowingStatus,
        /// Optional note, empty string on-chain when absent
        message: Option<String>,
    },
}

impl ContractCall {
    /// Registry entry for this call.
    pub fn operation(&self) -> OperationKind {
        match self {
            ContractCall::RegisterCurator { .. } => OperationKind::RegisterCurator,
            ContractCall::AddBook { .. } => OperationKind::AddBook,
            ContractCall::AddBookRequest { .. } => OperationKind::CreateBookRequest,
            ContractCall::BorrowBook { .. } => OperationKind::CreateBorrowing,
            ContractCall::AddBorrowingLog { .. } => OperationKind::AppendBorrowingLog,
        }
    }

    /// Arguments in signature order.
    pub fn tokens(&self) -> Vec<Token> {
        match self {
            ContractCall::RegisterCurator { name, metadata_uri } => {
                vec![Token::from(name.as_str()), Token::from(metadata_uri.as_str())]
            }
            ContractCall::AddBook {
                title,
                author,
                metadata_uri,
            } => vec![
                Token::from(title.as_str()),
                Token::from(author.as_str()),
                Token::from(metadata_uri.as_str()),
            ],
            ContractCall::AddBookRequest {
                book_token_id,
                return_date,
            } => vec![Token::Uint(*book_token_id), Token::from(*return_date)],
            ContractCall::BorrowBook {
                request_id,
                borrow_date,
                return_date,
            } => vec![
                Token::Uint(*request_id),
                Token::from(*borrow_date),
                Token::from(*return_date),
            ],
            ContractCall::AddBorrowingLog {
                borrowing_id,
                status,
                message,
            } => vec![
                Token::Uint(*borrowing_id),
                Token::from(u64::from(status.code())),
                Token::from(message.clone().unwrap_or_default()),
            ],
        }
    }
}

/// One on-chain call, immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    /// Target contract
    pub contract: ContractBinding,
    /// Method and arguments
    pub call: ContractCall,
    /// Wei attached to the call
    pub value: Option<U256>,
}

impl TransactionIntent {
    /// Intent with no attached value.
    pub fn new(contract: ContractBinding, call: ContractCall) -> Self {
        Self {
            contract,
            call,
            value: None,
        }
    }

    /// Attach wei.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Registry entry for the call.
    pub fn operation(&self) -> OperationKind {
        self.call.operation()
    }

    /// ABI-encoded calldata.
    pub fn calldata(&self) -> Vec<u8> {
        encode_call(self.operation().method_signature(), &self.call.tokens())
    }
}

/// Transaction handed to the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Sender
    pub from: Address,
    /// Contract
    pub to: Address,
    /// Calldata
    pub data: Vec<u8>,
    /// Wei
    pub value: Option<U256>,
    /// Gas limit; `None` when estimating
    pub gas: Option<u64>,
}

/// Log as found in a receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract
    pub address: Address,
    /// Topics, `topics[0]` is the event signature hash
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Vec<u8>,
}

/// Mined transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Inclusion block
    pub block_number: u64,
    /// `true` on success, `false` when reverted
    pub status: bool,
    /// Gas consumed
    pub gas_used: u64,
    /// Emitted logs
    pub logs: Vec<RawLog>,
}

/// Result of one submitted intent.
///
/// `block_confirmed == false` means no receipt was obtained; callers must
/// treat it as failed even though `hash` exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// Transaction hash
    pub hash: TxHash,
    /// Whether a successful receipt was observed
    pub block_confirmed: bool,
    /// Inclusion block, if confirmed
    pub block_number: Option<u64>,
    /// Logs from the receipt
    pub raw_logs: Vec<RawLog>,
}

impl TransactionOutcome {
    /// Outcome backed by a successful receipt.
    pub fn confirmed(receipt: TransactionReceipt) -> Self {
        Self {
            hash: receipt.tx_hash,
            block_confirmed: receipt.status,
            block_number: Some(receipt.block_number),
            raw_logs: receipt.logs,
        }
    }

    /// Outcome with a hash but no receipt.
    pub fn unconfirmed(hash: TxHash) -> Self {
        Self {
            hash,
            block_confirmed: false,
            block_number: None,
            raw_logs: Vec::new(),
        }
    }
}
