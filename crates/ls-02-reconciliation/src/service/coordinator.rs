//! # Reconciliation Coordinator
//!
//! Runs one domain operation against the chain, then mirrors it off-chain.
//!
//! ## Execute Steps
//!
//! 1. Log appends are validated against the stored log. Nothing is written
//!    on failure.
//! 2. Acquire a wallet session and submit through the gateway. A gateway
//!    failure is returned as is; no mirror write is attempted.
//! 3. Recover the protocol identifier from the receipt. When no expected
//!    event is found the chain has still changed, so the hash is returned
//!    in [`ReconciliationError::EventNotFound`] and an incident is opened.
//! 4. Upsert the mirror row keyed by the protocol identifier. A failed
//!    write never touches the chain again; the fact is returned in
//!    [`ReconciliationError::OffChainWriteFailed`] for
//!    [`ReconciliationApi::retry_off_chain`].

use crate::algorithms::{build_mirror, validate_append, MirrorRecord};
use crate::domain::{
    ChainFact, DomainOperation, IncidentKind, ProtocolId, ReconciledWrite, ReconciliationError,
    ReconciliationIncident, StoreError,
};
use crate::ports::{IncidentJournal, MirrorStore, ReconciliationApi};
use async_trait::async_trait;
use chrono::Utc;
use ls_01_chain_gateway::{
    ChainGatewayApi, EventDecoder, GatewayError, TransactionIntent, TransactionOutcome,
};
use ls_telemetry::log_chain_event;
use ls_telemetry::metrics::{record_incident_opened, record_reconciliation};
use ls_types::{hash_hex, Address, BorrowingRecord, RecordId, TxHash, U256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Dual-store coordinator.
pub struct ReconciliationCoordinator<G, S, J>
where
    G: ChainGatewayApi,
    S: MirrorStore,
    J: IncidentJournal,
{
    gateway: Arc<G>,
    store: Arc<S>,
    journal: Arc<J>,
    decoder: EventDecoder,
}

impl<G, S, J> ReconciliationCoordinator<G, S, J>
where
    G: ChainGatewayApi,
    S: MirrorStore,
    J: IncidentJournal,
{
    /// Coordinator decoding events from the gateway's contract only.
    pub fn new(gateway: Arc<G>, store: Arc<S>, journal: Arc<J>) -> Self {
        let decoder = EventDecoder::for_contract(gateway.contract().address);
        Self {
            gateway,
            store,
            journal,
            decoder,
        }
    }

    /// Chain gateway.
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Mirror store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Incident journal.
    pub fn journal(&self) -> &Arc<J> {
        &self.journal
    }

    async fn stored_borrowing(
        &self,
        id: RecordId,
    ) -> Result<BorrowingRecord, ReconciliationError> {
        self.store
            .borrowing(id)
            .await
            .map_err(ReconciliationError::Store)?
            .ok_or_else(|| {
                ReconciliationError::Store(StoreError::NotFound(format!("borrowing {id}")))
            })
    }

    /// Validate a log append against the stored log and return the
    /// on-chain borrowing id. Other operations need no preparation.
    async fn prepare(&self, op: &DomainOperation) -> Result<Option<U256>, ReconciliationError> {
        let DomainOperation::AppendBorrowingLog {
            borrowing_record_id,
            status,
            ..
        } = op
        else {
            return Ok(None);
        };

        let borrowing = self.stored_borrowing(*borrowing_record_id).await?;
        let log = self
            .store
            .borrowing_log(*borrowing_record_id)
            .await
            .map_err(ReconciliationError::Store)?;
        validate_append(&log, *status)?;
        Ok(Some(borrowing.on_chain_borrowing_id))
    }

    fn fact_from(
        &self,
        op: &DomainOperation,
        outcome: &TransactionOutcome,
        actor: Address,
        on_chain_borrowing_id: Option<U256>,
    ) -> Result<ChainFact, ReconciliationError> {
        let not_found = || ReconciliationError::EventNotFound {
            tx_hash: outcome.hash,
            operation: op.kind(),
        };

        let protocol_id = match (op.kind().event_shape(), op) {
            (Some(shape), _) => self
                .decoder
                .decode(outcome, shape)
                .map(ProtocolId::from_event)
                .map_err(|e| {
                    debug!(error = %e, "Event decode failed");
                    not_found()
                })?,
            (None, DomainOperation::AppendBorrowingLog { status, .. })
                if outcome.block_confirmed =>
            {
                ProtocolId::BorrowingLog {
                    borrowing_id: on_chain_borrowing_id.ok_or_else(not_found)?,
                    status: *status,
                }
            }
            (None, _) => return Err(not_found()),
        };

        Ok(ChainFact {
            tx_hash: outcome.hash,
            protocol_id,
            actor,
        })
    }

    /// Recover the chain fact an earlier submission of `op` produced.
    pub async fn recover_fact(
        &self,
        op: &DomainOperation,
        outcome: &TransactionOutcome,
        actor: Address,
    ) -> Result<ChainFact, ReconciliationError> {
        let on_chain_borrowing_id = match op {
            DomainOperation::AppendBorrowingLog {
                borrowing_record_id,
                ..
            } => Some(
                self.stored_borrowing(*borrowing_record_id)
                    .await?
                    .on_chain_borrowing_id,
            ),
            _ => None,
        };
        self.fact_from(op, outcome, actor, on_chain_borrowing_id)
    }

    async fn write_mirror(
        &self,
        op: &DomainOperation,
        fact: &ChainFact,
    ) -> Result<ReconciledWrite, ReconciliationError> {
        let failed = |source: StoreError| ReconciliationError::OffChainWriteFailed {
            fact: fact.clone(),
            source,
        };

        let record = build_mirror(op, fact, Utc::now())?;
        let record_id = match record {
            MirrorRecord::Curator(row) => self.store.upsert_curator(row).await.map(|r| r.id),
            MirrorRecord::Book(row) => self.store.upsert_book(row).await.map(|r| r.id),
            MirrorRecord::BookRequest(row) => {
                self.store.upsert_book_request(row).await.map(|r| r.id)
            }
            MirrorRecord::Borrowing(row) => self.store.create_borrowing(row).await.map(|r| r.id),
            MirrorRecord::BorrowingLog(row) => {
                let log = self
                    .store
                    .borrowing_log(row.borrowing_id)
                    .await
                    .map_err(failed)?;
                // A replayed entry goes to the store's conflict policy.
                if !log.iter().any(|e| e.status == row.status) {
                    validate_append(&log, row.status)
                        .map_err(|e| failed(StoreError::Validation(e.to_string())))?;
                }
                self.store.append_borrowing_log(row).await.map(|r| r.id)
            }
        }
        .map_err(failed)?;

        Ok(ReconciledWrite {
            transaction_hash: fact.tx_hash,
            protocol_id: fact.protocol_id.clone(),
            record_id,
        })
    }

    async fn open_incident(
        &self,
        kind: IncidentKind,
        op: &DomainOperation,
        tx_hash: TxHash,
        actor: Address,
        protocol_id: Option<ProtocolId>,
        error: String,
    ) {
        let incident =
            ReconciliationIncident::open(kind, op.clone(), tx_hash, actor, protocol_id, error);
        match self.journal.record(&incident).await {
            Ok(()) => {
                record_incident_opened();
                log_chain_event!(
                    warn,
                    op.kind(),
                    "Reconciliation incident opened",
                    hash_hex(&tx_hash),
                    incident_id = %incident.id,
                    kind = %kind
                );
            }
            Err(e) => {
                warn!(
                    tx_hash = %hash_hex(&tx_hash),
                    kind = %kind,
                    error = %e,
                    "Failed to journal reconciliation incident"
                );
            }
        }
    }

    #[instrument(skip_all, fields(operation = %op.kind()))]
    async fn run(&self, op: &DomainOperation) -> Result<ReconciledWrite, ReconciliationError> {
        let on_chain_borrowing_id = self.prepare(op).await?;
        let call = op.contract_call(on_chain_borrowing_id)?;

        let session = self
            .gateway
            .acquire_session()
            .await
            .map_err(ReconciliationError::Wallet)?;
        let intent = TransactionIntent::new(self.gateway.contract().clone(), call);

        let outcome = match self.gateway.call(&session, &intent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let GatewayError::Unconfirmed { tx_hash } = &e {
                    self.open_incident(
                        IncidentKind::Unconfirmed,
                        op,
                        *tx_hash,
                        session.address,
                        None,
                        e.to_string(),
                    )
                    .await;
                }
                return Err(ReconciliationError::OnChain(e));
            }
        };

        let fact = match self.fact_from(op, &outcome, session.address, on_chain_borrowing_id) {
            Ok(fact) => fact,
            Err(e) => {
                self.open_incident(
                    IncidentKind::EventNotFound,
                    op,
                    outcome.hash,
                    session.address,
                    None,
                    e.to_string(),
                )
                .await;
                return Err(e);
            }
        };

        match self.write_mirror(op, &fact).await {
            Ok(write) => {
                info!(
                    tx_hash = %hash_hex(&write.transaction_hash),
                    protocol_id = %write.protocol_id,
                    record_id = %write.record_id,
                    "Operation reconciled"
                );
                Ok(write)
            }
            Err(e) => {
                if matches!(e, ReconciliationError::OffChainWriteFailed { .. }) {
                    self.open_incident(
                        IncidentKind::OffChainWriteFailed,
                        op,
                        fact.tx_hash,
                        fact.actor,
                        Some(fact.protocol_id.clone()),
                        e.to_string(),
                    )
                    .await;
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<G, S, J> ReconciliationApi for ReconciliationCoordinator<G, S, J>
where
    G: ChainGatewayApi,
    S: MirrorStore,
    J: IncidentJournal,
{
    async fn execute(&self, op: DomainOperation) -> Result<ReconciledWrite, ReconciliationError> {
        let operation = op.kind();
        let result = self.run(&op).await;
        match &result {
            Ok(_) => record_reconciliation(operation.as_str(), "reconciled"),
            Err(e) => {
                record_reconciliation(operation.as_str(), e.label());
                warn!(operation = %operation, error = %e, "Operation not reconciled");
            }
        }
        result
    }

    async fn retry_off_chain(
        &self,
        op: &DomainOperation,
        fact: &ChainFact,
    ) -> Result<ReconciledWrite, ReconciliationError> {
        if fact.protocol_id.operation() != op.kind() {
            return Err(ReconciliationError::MismatchedFact {
                operation: op.kind(),
                fact: fact.clone(),
            });
        }
        let result = self.write_mirror(op, fact).await;
        let outcome = match &result {
            Ok(_) => "retried",
            Err(e) => e.label(),
        };
        record_reconciliation(op.kind().as_str(), outcome);
        log_chain_event!(
            info,
            op.kind(),
            "Off-chain retry finished",
            hash_hex(&fact.tx_hash),
            outcome = outcome
        );
        result
    }
}
