//! # Wallet Session Acquisition
//!
//! Sessions are acquired per top-level operation and re-validated right
//! before each contract call. Nothing here caches a session: the wallet can
//! switch account or network at any time.

use crate::algorithms::classify;
use crate::domain::{DomainErrorKind, GatewayConfig};
use crate::ports::ChainProvider;
use ls_telemetry::metrics::record_wallet_acquire;
use ls_types::{address_hex, ChainId, WalletSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Acquires and re-validates wallet sessions against one required network.
pub struct WalletConnector<P: ChainProvider> {
    provider: Arc<P>,
    required_chain_id: ChainId,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl<P: ChainProvider> WalletConnector<P> {
    /// Connector using the gateway config's network and polling policy.
    pub fn new(provider: Arc<P>, config: &GatewayConfig) -> Self {
        Self {
            provider,
            required_chain_id: config.required_chain_id,
            poll_attempts: config.wallet_poll_attempts.max(1),
            poll_interval: config.wallet_poll_interval(),
        }
    }

    /// Network sessions must be on.
    pub fn required_chain_id(&self) -> ChainId {
        self.required_chain_id
    }

    /// Acquire a connected session on the required network.
    ///
    /// May trigger wallet prompts for account access or a network switch.
    pub async fn acquire(&self) -> Result<WalletSession, DomainErrorKind> {
        let result = self.acquire_inner().await;
        match &result {
            Ok(session) => {
                record_wallet_acquire("connected");
                info!(
                    address = %address_hex(&session.address),
                    chain_id = %session.chain_id,
                    "Wallet session acquired"
                );
            }
            Err(kind) => {
                record_wallet_acquire(kind.label());
                warn!(kind = kind.label(), "Wallet session not acquired");
            }
        }
        result
    }

    async fn acquire_inner(&self) -> Result<WalletSession, DomainErrorKind> {
        self.wait_for_wallet().await?;

        let mut accounts = self.provider.accounts().await.map_err(|e| classify(&e))?;
        if accounts.is_empty() {
            debug!("No account exposed, requesting access");
            accounts = self
                .provider
                .request_accounts()
                .await
                .map_err(|e| classify(&e))?;
        }
        let address = *accounts
            .first()
            .ok_or(DomainErrorKind::WalletDisconnected)?;

        let chain_id = self.ensure_network().await?;
        Ok(WalletSession::connected(address, chain_id))
    }

    async fn wait_for_wallet(&self) -> Result<(), DomainErrorKind> {
        for attempt in 1..=self.poll_attempts {
            if self.provider.is_available().await {
                return Ok(());
            }
            debug!(attempt, max = self.poll_attempts, "Wallet not available yet");
            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Err(DomainErrorKind::WalletMissing)
    }

    async fn ensure_network(&self) -> Result<ChainId, DomainErrorKind> {
        let current = self.provider.chain_id().await.map_err(|e| classify(&e))?;
        if current == self.required_chain_id {
            return Ok(current);
        }

        info!(
            current = %current,
            required = %self.required_chain_id,
            "Wallet on wrong network, requesting switch"
        );
        if let Err(e) = self.provider.switch_network(self.required_chain_id).await {
            warn!(error = %e, "Network switch failed");
            return Err(DomainErrorKind::WrongNetwork);
        }

        let switched = self.provider.chain_id().await.map_err(|e| classify(&e))?;
        if switched != self.required_chain_id {
            return Err(DomainErrorKind::WrongNetwork);
        }
        Ok(switched)
    }

    /// Check that `session` still matches what the wallet reports.
    ///
    /// Never prompts. A changed account reads as disconnected, a changed
    /// network as wrong network.
    pub async fn revalidate(&self, session: &WalletSession) -> Result<(), DomainErrorKind> {
        if !session.is_connected {
            return Err(DomainErrorKind::WalletDisconnected);
        }
        if !self.provider.is_available().await {
            return Err(DomainErrorKind::WalletMissing);
        }

        let accounts = self.provider.accounts().await.map_err(|e| classify(&e))?;
        if !accounts.contains(&session.address) {
            return Err(DomainErrorKind::WalletDisconnected);
        }

        let chain_id = self.provider.chain_id().await.map_err(|e| classify(&e))?;
        if chain_id != self.required_chain_id || chain_id != session.chain_id {
            return Err(DomainErrorKind::WrongNetwork);
        }
        Ok(())
    }
}
