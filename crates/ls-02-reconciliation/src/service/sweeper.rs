//! # Reconciliation Sweep
//!
//! Walks pending incidents and tries to bring the mirror in line with the
//! chain. Never submits a transaction.
//!
//! | Incident state | Action |
//! |----------------|--------|
//! | Protocol id known | Retry the mirror write |
//! | Protocol id unknown | Fetch the receipt, re-decode, then mirror |
//! | Receipt still missing | Count an attempt |
//! | Transaction reverted | Resolve; the chain never changed |
//! | Attempts exhausted | Leave pending for an operator |

use super::coordinator::ReconciliationCoordinator;
use crate::domain::{
    IncidentKind, ReconciliationConfig, ReconciliationError, ReconciliationIncident, StoreError,
};
use crate::ports::{IncidentJournal, MirrorStore, ReconciliationApi};
use ls_01_chain_gateway::{ChainGatewayApi, GatewayError};
use ls_telemetry::metrics::record_incident_resolved;
use ls_types::hash_hex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Incidents looked at
    pub examined: usize,
    /// Mirrored and closed
    pub resolved: usize,
    /// Closed because the transaction reverted
    pub reverted: usize,
    /// Attempted and still open
    pub still_pending: usize,
    /// Skipped after too many attempts
    pub exhausted: usize,
}

enum Step {
    Mirrored,
    Reverted,
    Pending(String),
}

/// Sweeps the incident journal through a coordinator.
pub struct ReconciliationSweeper<G, S, J>
where
    G: ChainGatewayApi,
    S: MirrorStore,
    J: IncidentJournal,
{
    coordinator: Arc<ReconciliationCoordinator<G, S, J>>,
    config: ReconciliationConfig,
}

impl<G, S, J> ReconciliationSweeper<G, S, J>
where
    G: ChainGatewayApi,
    S: MirrorStore,
    J: IncidentJournal,
{
    /// Sweeper bounded by `config`.
    pub fn new(
        coordinator: Arc<ReconciliationCoordinator<G, S, J>>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Run one bounded pass over pending incidents.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let pending = self
            .coordinator
            .journal()
            .pending(self.config.max_sweep_batch)
            .await?;

        let mut report = SweepReport::default();
        for mut incident in pending {
            report.examined += 1;
            if incident.attempts >= self.config.max_incident_attempts {
                report.exhausted += 1;
                continue;
            }

            match self.attempt(&mut incident).await {
                Step::Mirrored => {
                    incident.resolve();
                    report.resolved += 1;
                }
                Step::Reverted => {
                    incident.last_error = Some("transaction reverted".to_string());
                    incident.resolve();
                    report.reverted += 1;
                }
                Step::Pending(reason) => {
                    debug!(incident_id = %incident.id, reason = %reason, "Incident still pending");
                    incident.note_attempt(reason);
                    report.still_pending += 1;
                }
            }

            if !incident.is_pending() {
                record_incident_resolved();
                info!(
                    incident_id = %incident.id,
                    tx_hash = %hash_hex(&incident.tx_hash),
                    "Incident resolved"
                );
            }
            if let Err(e) = self.coordinator.journal().record(&incident).await {
                warn!(incident_id = %incident.id, error = %e, "Failed to update incident");
            }
        }

        info!(
            examined = report.examined,
            resolved = report.resolved,
            reverted = report.reverted,
            still_pending = report.still_pending,
            exhausted = report.exhausted,
            "Reconciliation sweep finished"
        );
        Ok(report)
    }

    async fn attempt(&self, incident: &mut ReconciliationIncident) -> Step {
        let fact = match incident.fact() {
            Some(fact) => fact,
            None => {
                let outcome = match self
                    .coordinator
                    .gateway()
                    .fetch_outcome(incident.tx_hash)
                    .await
                {
                    Ok(Some(outcome)) => outcome,
                    Ok(None) => return Step::Pending("receipt not available".to_string()),
                    Err(GatewayError::Reverted { .. }) => return Step::Reverted,
                    Err(e) => return Step::Pending(e.to_string()),
                };
                match self
                    .coordinator
                    .recover_fact(&incident.operation, &outcome, incident.actor)
                    .await
                {
                    Ok(fact) => {
                        incident.kind = IncidentKind::OffChainWriteFailed;
                        incident.protocol_id = Some(fact.protocol_id.clone());
                        fact
                    }
                    Err(e) => {
                        if matches!(e, ReconciliationError::EventNotFound { .. }) {
                            incident.kind = IncidentKind::EventNotFound;
                        }
                        return Step::Pending(e.to_string());
                    }
                }
            }
        };

        match self
            .coordinator
            .retry_off_chain(&incident.operation, &fact)
            .await
        {
            Ok(_) => Step::Mirrored,
            Err(e) => Step::Pending(e.to_string()),
        }
    }
}
