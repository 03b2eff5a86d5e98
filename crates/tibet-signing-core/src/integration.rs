use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{Asset, Notice, SignedOffer};
use crate::negotiator::NegotiationError;
use crate::ports::{Notifier, PortError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletKind {
    WalletConnect,
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitStage {
    ClientInit,
    Approval,
    OfferRequest,
    BalanceLookup,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitStage::ClientInit => "client init",
            WaitStage::Approval => "session approval",
            WaitStage::OfferRequest => "offer request",
            WaitStage::BalanceLookup => "balance lookup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("signer initialization failed: {0}")]
    Initialization(String),
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),
    #[error("handshake cancelled")]
    HandshakeCancelled,
    #[error("signer channel error: {0}")]
    Channel(String),
    #[error("wallet not connected")]
    NotConnected,
    #[error("offer negotiation failed: {0}")]
    Negotiation(String),
    #[error("invalid offer: {0}")]
    InvalidOffer(#[from] NegotiationError),
    #[error("timed out waiting for {0}")]
    Timeout(WaitStage),
    #[error("another wallet request is already in flight")]
    Busy,
}

impl WalletError {
    /// Maps a port failure raised while talking to an established session.
    pub fn from_port(err: PortError) -> Self {
        match err {
            PortError::Rejected(reason) => WalletError::Negotiation(format!("rejected: {reason}")),
            other => WalletError::Negotiation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationTimeouts {
    pub init: Duration,
    pub approval: Duration,
    pub request: Duration,
}

impl Default for IntegrationTimeouts {
    fn default() -> Self {
        Self {
            init: Duration::from_secs(15),
            approval: Duration::from_secs(5 * 60),
            request: Duration::from_secs(5 * 60),
        }
    }
}

/// Contract every signer backend implements. Nothing here panics or surfaces errors the
/// caller must handle: failures are also pushed through the backend's notifier.
#[async_trait]
pub trait WalletIntegration: Send + Sync {
    fn kind(&self) -> WalletKind;
    fn name(&self) -> &'static str;
    fn image(&self) -> &'static str;

    /// Resumes an existing pairing or runs a new handshake. `true` once a session is approved.
    async fn connect(&self) -> bool;

    /// Store lookup only; never presents an out-of-band channel.
    async fn eagerly_connect(&self) -> bool;

    async fn disconnect(&self);

    async fn generate_offer(
        &self,
        request: &[Asset],
        offer: &[Asset],
    ) -> Result<SignedOffer, WalletError>;

    /// Reserved; backends may report a balance in atomic units.
    async fn get_balance(&self, _asset_id: Option<&str>) -> Result<Option<u64>, WalletError> {
        Ok(None)
    }
}

/// Serializes interactive flows on one integration; a second caller is turned away.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    lock: Mutex<()>,
}

impl InFlightGuard {
    pub fn try_enter(&self) -> Result<MutexGuard<'_, ()>, WalletError> {
        self.lock.try_lock().map_err(|_| WalletError::Busy)
    }

    /// Waits for the running flow, if any, to finish.
    pub async fn enter(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

pub(crate) fn report(notifier: &dyn Notifier, name: &str, err: &WalletError) {
    tracing::warn!(wallet = name, error = %err, "wallet operation failed");
    notifier.notify(Notice::error(format!("Wallet - {err}")));
}
