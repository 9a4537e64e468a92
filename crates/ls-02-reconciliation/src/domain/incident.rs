//! Reconciliation incidents: chain effects whose mirror is missing.

use super::operation::{ChainFact, DomainOperation, ProtocolId};
use chrono::{DateTime, Utc};
use ls_types::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why an incident was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    /// Broadcast but never confirmed; it may still mine.
    Unconfirmed,
    /// Confirmed, but no expected event decoded.
    EventNotFound,
    /// Decoded, but the mirror write failed.
    OffChainWriteFailed,
}

impl IncidentKind {
    /// Stable text form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::Unconfirmed => "unconfirmed",
            IncidentKind::EventNotFound => "event_not_found",
            IncidentKind::OffChainWriteFailed => "off_chain_write_failed",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unconfirmed" => Ok(IncidentKind::Unconfirmed),
            "event_not_found" => Ok(IncidentKind::EventNotFound),
            "off_chain_write_failed" => Ok(IncidentKind::OffChainWriteFailed),
            other => Err(format!("unknown incident kind: {other}")),
        }
    }
}

/// A pending or resolved reconciliation incident.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationIncident {
    /// Incident id
    pub id: Uuid,
    /// Current classification
    pub kind: IncidentKind,
    /// Operation whose mirror is missing
    pub operation: DomainOperation,
    /// Transaction on the chain
    pub tx_hash: TxHash,
    /// Sending wallet
    pub actor: Address,
    /// Known once the event has been decoded
    pub protocol_id: Option<ProtocolId>,
    /// Sweep attempts so far
    pub attempts: u32,
    /// Most recent failure
    pub last_error: Option<String>,
    /// When it was opened
    pub recorded_at: DateTime<Utc>,
    /// When both stores agreed
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReconciliationIncident {
    /// Open a new incident.
    pub fn open(
        kind: IncidentKind,
        operation: DomainOperation,
        tx_hash: TxHash,
        actor: Address,
        protocol_id: Option<ProtocolId>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            operation,
            tx_hash,
            actor,
            protocol_id,
            attempts: 0,
            last_error: Some(error.into()),
            recorded_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Chain fact, once the protocol id is known.
    pub fn fact(&self) -> Option<ChainFact> {
        self.protocol_id.clone().map(|protocol_id| ChainFact {
            tx_hash: self.tx_hash,
            protocol_id,
            actor: self.actor,
        })
    }

    /// Whether the incident is still open.
    pub fn is_pending(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Record a failed sweep attempt.
    pub fn note_attempt(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.last_error = Some(error.into());
    }

    /// Mark resolved now.
    pub fn resolve(&mut self) {
        self.resolved_at = Some(Utc::now());
    }
}
