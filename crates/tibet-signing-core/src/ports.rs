use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    ClientOptions, ConnectParams, ConnectProposal, Notice, PairingSession, SessionRecord,
    SessionRequest,
};
use crate::modal::ModalHandle;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected by signer: {0}")]
    Rejected(String),
}

/// A live remote-signer SDK client. The pairing and session stores it exposes are owned by
/// the signer runtime; callers only read them.
#[async_trait]
pub trait SignClientPort: Send + Sync {
    async fn pairings(&self) -> Result<Vec<PairingSession>, PortError>;
    async fn sessions(&self) -> Result<Vec<SessionRecord>, PortError>;
    async fn connect(&self, params: ConnectParams) -> Result<ConnectProposal, PortError>;
    /// Resolves once the signer approves or rejects the proposal.
    async fn approval(&self, proposal: &ConnectProposal) -> Result<SessionRecord, PortError>;
    async fn request(&self, request: SessionRequest) -> Result<Value, PortError>;
    async fn disconnect(&self, topic: &str) -> Result<(), PortError>;
}

/// Constructs the SDK client. Equivalent of the SDK's static `init`.
#[async_trait]
pub trait SignClientFactory: Send + Sync {
    async fn init(&self, options: &ClientOptions) -> Result<Arc<dyn SignClientPort>, PortError>;
}

/// Request surface of an injected browser-extension wallet.
#[async_trait]
pub trait InjectedProviderPort: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;
}

/// Displays an out-of-band pairing payload until the returned handle is closed.
pub trait ConnectionPresenter: Send + Sync {
    fn present(&self, payload: &str) -> Result<ModalHandle, PortError>;
}

/// Fire-and-forget user notifications (toasts).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}
