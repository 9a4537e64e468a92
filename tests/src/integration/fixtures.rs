//! Shared harness for cross-crate flows.

use chrono::{DateTime, TimeZone, Utc};
use ls_01_chain_gateway::algorithms::encode;
use ls_01_chain_gateway::{
    ContractGateway, EventShape, GatewayConfig, MockChainProvider, RawLog, Token,
};
use ls_02_reconciliation::{
    DomainOperation, IncidentJournal, InMemoryIncidentJournal, InMemoryMirrorStore, MirrorStore,
    ReconciliationConfig, ReconciliationCoordinator, ReconciliationSweeper,
};
use ls_types::{Address, BorrowingStatus, ChainId, RecordId, U256};
use std::sync::Arc;

/// Chain the scripted wallet is bound to.
pub const CHAIN: ChainId = ChainId(31_337);

/// Gateway over the scripted provider.
pub type TestGateway = ContractGateway<MockChainProvider>;

pub fn account() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn contract() -> Address {
    Address::repeat_byte(0xcc)
}

/// Fast polling and a short confirmation wait.
pub fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        required_chain_id: CHAIN,
        contract_address: contract(),
        wallet_poll_interval_ms: 1,
        confirmation_timeout_ms: 50,
        ..Default::default()
    }
}

pub fn gateway(provider: MockChainProvider) -> Arc<TestGateway> {
    Arc::new(ContractGateway::new(Arc::new(provider), gateway_config()))
}

/// Log emitted by the lending contract.
pub fn event_log(shape: EventShape, tokens: &[Token]) -> RawLog {
    RawLog {
        address: contract(),
        topics: vec![shape.topic()],
        data: encode(tokens),
    }
}

pub fn curator_registered(unique_id: &str, token_id: u64) -> RawLog {
    event_log(
        EventShape::CuratorRegistered,
        &[Token::from(unique_id), Token::from(token_id)],
    )
}

pub fn book_added(unique_id: &str, token_id: u64) -> RawLog {
    event_log(
        EventShape::BookAdded,
        &[Token::from(unique_id), Token::from(token_id)],
    )
}

pub fn book_request_added(id: u64) -> RawLog {
    event_log(EventShape::BookRequestAdded, &[Token::from(id)])
}

pub fn book_borrowed(borrowing_id: u64) -> RawLog {
    event_log(EventShape::BookBorrowed, &[Token::from(borrowing_id)])
}

pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn register_curator() -> DomainOperation {
    DomainOperation::RegisterCurator {
        name: "Acme Library".to_string(),
        metadata_uri: "ipfs://acme".to_string(),
    }
}

pub fn add_book() -> DomainOperation {
    DomainOperation::AddBook {
        title: "The Dispossessed".to_string(),
        author: "Ursula K. Le Guin".to_string(),
        metadata_uri: "ipfs://dispossessed".to_string(),
    }
}

pub fn request_book(book_id: RecordId, book_token_id: u64) -> DomainOperation {
    DomainOperation::CreateBookRequest {
        book_id,
        book_token_id: U256::from(book_token_id),
        return_date: date(20),
    }
}

pub fn borrow_book(request_id: u64, book_id: RecordId) -> DomainOperation {
    DomainOperation::CreateBorrowing {
        request_id: U256::from(request_id),
        book_id,
        borrower_wallet: account(),
        borrow_date: date(6),
        return_date: date(20),
    }
}

pub fn append(borrowing_record_id: RecordId, status: BorrowingStatus) -> DomainOperation {
    DomainOperation::AppendBorrowingLog {
        borrowing_record_id,
        status,
        message: None,
    }
}

/// Coordinator wired to any store/journal pair over the scripted chain.
pub struct Harness<S: MirrorStore, J: IncidentJournal> {
    pub coordinator: Arc<ReconciliationCoordinator<TestGateway, S, J>>,
}

impl Harness<InMemoryMirrorStore, InMemoryIncidentJournal> {
    pub fn in_memory(provider: MockChainProvider) -> Self {
        Self::with_stores(
            provider,
            Arc::new(InMemoryMirrorStore::new()),
            Arc::new(InMemoryIncidentJournal::new()),
        )
    }
}

impl<S: MirrorStore, J: IncidentJournal> Harness<S, J> {
    pub fn with_stores(provider: MockChainProvider, store: Arc<S>, journal: Arc<J>) -> Self {
        Self {
            coordinator: Arc::new(ReconciliationCoordinator::new(
                gateway(provider),
                store,
                journal,
            )),
        }
    }

    pub fn provider(&self) -> &Arc<MockChainProvider> {
        self.coordinator.gateway().provider()
    }

    pub fn store(&self) -> &Arc<S> {
        self.coordinator.store()
    }

    pub fn journal(&self) -> &Arc<J> {
        self.coordinator.journal()
    }

    pub fn sweeper(&self) -> ReconciliationSweeper<TestGateway, S, J> {
        ReconciliationSweeper::new(
            self.coordinator.clone(),
            ReconciliationConfig {
                max_sweep_batch: 10,
                max_incident_attempts: 3,
            },
        )
    }
}
