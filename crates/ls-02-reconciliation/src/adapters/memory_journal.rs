//! In-memory incident journal.

use crate::domain::{ReconciliationIncident, StoreError};
use crate::ports::IncidentJournal;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// `IncidentJournal` held in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryIncidentJournal {
    incidents: RwLock<Vec<ReconciliationIncident>>,
    unavailable: AtomicBool,
}

impl InMemoryIncidentJournal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every journal call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every incident, resolved or not.
    pub fn all(&self) -> Vec<ReconciliationIncident> {
        self.incidents.read().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("journal unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IncidentJournal for InMemoryIncidentJournal {
    async fn record(&self, incident: &ReconciliationIncident) -> Result<(), StoreError> {
        self.check()?;
        let mut incidents = self.incidents.write();
        match incidents.iter_mut().find(|i| i.id == incident.id) {
            Some(existing) => *existing = incident.clone(),
            None => incidents.push(incident.clone()),
        }
        Ok(())
    }

    async fn pending(&self, limit: usize) -> Result<Vec<ReconciliationIncident>, StoreError> {
        self.check()?;
        Ok(self
            .incidents
            .read()
            .iter()
            .filter(|i| i.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReconciliationIncident>, StoreError> {
        self.check()?;
        Ok(self.incidents.read().iter().find(|i| i.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainOperation, IncidentKind};
    use ls_types::{Address, TxHash};

    fn incident(n: u64) -> ReconciliationIncident {
        ReconciliationIncident::open(
            IncidentKind::Unconfirmed,
            DomainOperation::RegisterCurator {
                name: format!("curator {n}"),
                metadata_uri: String::new(),
            },
            TxHash::from_low_u64_be(n),
            Address::repeat_byte(1),
            None,
            "not mined",
        )
    }

    #[tokio::test]
    async fn test_record_replaces_by_id() {
        let journal = InMemoryIncidentJournal::new();
        let mut first = incident(1);
        journal.record(&first).await.unwrap();
        first.note_attempt("still pending");
        journal.record(&first).await.unwrap();

        assert_eq!(journal.all().len(), 1);
        assert_eq!(journal.get(first.id).await.unwrap().unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_pending_skips_resolved_and_respects_limit() {
        let journal = InMemoryIncidentJournal::new();
        let mut resolved = incident(1);
        resolved.resolve();
        journal.record(&resolved).await.unwrap();
        for n in 2..5 {
            journal.record(&incident(n)).await.unwrap();
        }

        let pending = journal.pending(2).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].tx_hash, TxHash::from_low_u64_be(2));
    }

    #[tokio::test]
    async fn test_unavailable_journal_fails() {
        let journal = InMemoryIncidentJournal::new();
        journal.set_unavailable(true);
        assert!(journal.record(&incident(1)).await.is_err());
    }
}
