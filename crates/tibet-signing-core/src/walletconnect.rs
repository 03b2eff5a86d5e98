//! Remote-pairing signer backend (WalletConnect sign protocol).
//!
//! `connect` walks the pairing state machine: reuse an approved session, else resume the
//! active pairing without any out-of-band channel, else present a fresh pairing URI and wait
//! for the signer to approve it. Every wait is bounded; closing the modal cancels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{
    chia_required_namespaces, Asset, ClientOptions, ConnectParams, ConnectProposal, Namespaces,
    Notice, SessionRecord, SignedOffer, CHIA_MAINNET, METHOD_CREATE_OFFER_FOR_IDS,
};
use crate::integration::{
    report, InFlightGuard, IntegrationTimeouts, WaitStage, WalletError, WalletIntegration,
    WalletKind,
};
use crate::modal::ModalHandle;
use crate::negotiator::OfferNegotiator;
use crate::ports::{ConnectionPresenter, Notifier, PortError, SignClientFactory, SignClientPort};
use crate::session::{active_pairing, canonical_session, SignerClient};
use crate::state_machine::{connection_transition, ConnectionAction, ConnectionState};

#[derive(Debug, Clone)]
pub struct WalletConnectOptions {
    pub client: ClientOptions,
    pub required_namespaces: Namespaces,
    pub chain_id: String,
    pub timeouts: IntegrationTimeouts,
    /// Also terminate the remote session on `disconnect`.
    pub disconnect_remote: bool,
}

impl Default for WalletConnectOptions {
    fn default() -> Self {
        Self {
            client: ClientOptions::default(),
            required_namespaces: chia_required_namespaces(),
            chain_id: CHIA_MAINNET.to_owned(),
            timeouts: IntegrationTimeouts::default(),
            disconnect_remote: false,
        }
    }
}

pub struct WalletConnectIntegration {
    client: SignerClient,
    presenter: Arc<dyn ConnectionPresenter>,
    notifier: Arc<dyn Notifier>,
    negotiator: OfferNegotiator,
    namespaces: Namespaces,
    approval_timeout: Duration,
    disconnect_remote: bool,
    state: Mutex<ConnectionState>,
    session_topic: Mutex<Option<String>>,
    /// Set by `disconnect`; offers stay refused until a session is held again.
    released: AtomicBool,
    abort: Notify,
    guard: InFlightGuard,
}

impl WalletConnectIntegration {
    pub fn new(
        factory: Arc<dyn SignClientFactory>,
        presenter: Arc<dyn ConnectionPresenter>,
        notifier: Arc<dyn Notifier>,
        options: WalletConnectOptions,
    ) -> Self {
        let negotiator = OfferNegotiator {
            chain_id: options.chain_id,
            method: METHOD_CREATE_OFFER_FOR_IDS.to_owned(),
            request_timeout: options.timeouts.request,
        };
        Self {
            client: SignerClient::new(factory, options.client, options.timeouts.init),
            presenter,
            notifier,
            negotiator,
            namespaces: options.required_namespaces,
            approval_timeout: options.timeouts.approval,
            disconnect_remote: options.disconnect_remote,
            state: Mutex::new(ConnectionState::NoClient),
            session_topic: Mutex::new(None),
            released: AtomicBool::new(false),
            abort: Notify::new(),
            guard: InFlightGuard::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Topic of the session this instance currently holds, if any.
    pub fn session_topic(&self) -> Option<String> {
        self.session_topic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply(&self, action: ConnectionAction) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match connection_transition(*state, action) {
            Ok((next, transition)) => {
                tracing::debug!(
                    from = ?transition.from,
                    to = ?transition.to,
                    reason = transition.reason,
                    "walletconnect state"
                );
                *state = next;
            }
            Err(err) => tracing::error!(error = %err, "walletconnect state left unchanged"),
        }
    }

    fn hold_session(&self, topic: Option<String>) {
        if topic.is_some() {
            self.released.store(false, Ordering::SeqCst);
        }
        *self
            .session_topic
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = topic;
    }

    /// A flow dropped mid-handshake leaves an intermediate state behind.
    fn recover_interrupted(&self) {
        if matches!(
            self.state(),
            ConnectionState::NoPairing
                | ConnectionState::PairingActive
                | ConnectionState::HandshakePending
        ) {
            self.apply(ConnectionAction::Cancelled);
        }
    }

    async fn ensure_client(&self) -> Result<Arc<dyn SignClientPort>, WalletError> {
        match self.client.get_or_init().await {
            Ok(client) => {
                if self.state() == ConnectionState::NoClient {
                    self.apply(ConnectionAction::ClientInitialized);
                }
                Ok(client)
            }
            Err(err) => {
                self.apply(ConnectionAction::ClientInitFailed);
                Err(err)
            }
        }
    }

    async fn lookup_session(
        &self,
        client: &dyn SignClientPort,
    ) -> Result<Option<SessionRecord>, WalletError> {
        let sessions = client
            .sessions()
            .await
            .map_err(|e| WalletError::Channel(format!("session lookup failed: {e}")))?;
        let session = canonical_session(&sessions).cloned();
        match (&session, self.state()) {
            (Some(found), ConnectionState::ClientReady | ConnectionState::SessionApproved) => {
                self.apply(ConnectionAction::SessionFound);
                self.hold_session(Some(found.topic.clone()));
            }
            (None, ConnectionState::SessionApproved) => {
                self.apply(ConnectionAction::SessionLost);
                self.hold_session(None);
            }
            _ => {}
        }
        Ok(session)
    }

    async fn connect_inner(&self) -> Result<SessionRecord, WalletError> {
        self.recover_interrupted();
        let client = self.ensure_client().await?;

        if let Some(session) = self.lookup_session(client.as_ref()).await? {
            tracing::info!(topic = %session.topic, "reusing approved session");
            return Ok(session);
        }

        let pairings = client
            .pairings()
            .await
            .map_err(|e| WalletError::Channel(format!("pairing lookup failed: {e}")))?;

        match active_pairing(&pairings).map(|pairing| pairing.topic.clone()) {
            Some(pairing_topic) => {
                self.apply(ConnectionAction::ActivePairingFound);
                tracing::info!(%pairing_topic, "persisting previous connection");
                let proposal = self
                    .propose(client.as_ref(), Some(pairing_topic))
                    .await?;
                self.await_approval(client.as_ref(), &proposal, None).await
            }
            None => {
                self.apply(ConnectionAction::NoActivePairing);
                tracing::info!("creating new connection");
                let proposal = self.propose(client.as_ref(), None).await?;
                let modal = self.present(&proposal)?;
                self.apply(ConnectionAction::HandshakePresented);
                let result = self
                    .await_approval(client.as_ref(), &proposal, Some(&modal))
                    .await;
                modal.close();
                result
            }
        }
    }

    async fn propose(
        &self,
        client: &dyn SignClientPort,
        pairing_topic: Option<String>,
    ) -> Result<ConnectProposal, WalletError> {
        let params = ConnectParams {
            pairing_topic,
            required_namespaces: self.namespaces.clone(),
        };
        client.connect(params).await.map_err(|err| {
            self.apply(ConnectionAction::Rejected);
            handshake_error(err)
        })
    }

    fn present(&self, proposal: &ConnectProposal) -> Result<ModalHandle, WalletError> {
        let uri = match proposal.uri.as_deref() {
            Some(uri) => uri,
            None => {
                self.apply(ConnectionAction::Rejected);
                return Err(WalletError::Channel(
                    "signer returned no pairing uri".to_owned(),
                ));
            }
        };
        self.presenter.present(uri).map_err(|err| {
            self.apply(ConnectionAction::Rejected);
            WalletError::Channel(format!("pairing modal failed: {err}"))
        })
    }

    async fn await_approval(
        &self,
        client: &dyn SignClientPort,
        proposal: &ConnectProposal,
        modal: Option<&ModalHandle>,
    ) -> Result<SessionRecord, WalletError> {
        let approval = tokio::time::timeout(self.approval_timeout, client.approval(proposal));
        let cancelled = async {
            match modal {
                Some(modal) => tokio::select! {
                    _ = modal.closed() => {}
                    _ = self.abort.notified() => {}
                },
                None => self.abort.notified().await,
            }
        };
        let outcome = tokio::select! {
            outcome = approval => outcome,
            _ = cancelled => {
                self.apply(ConnectionAction::Cancelled);
                return Err(WalletError::HandshakeCancelled);
            }
        };

        match outcome {
            Err(_) => {
                self.apply(ConnectionAction::TimedOut);
                Err(WalletError::Timeout(WaitStage::Approval))
            }
            Ok(Err(err)) => {
                self.apply(ConnectionAction::Rejected);
                Err(handshake_error(err))
            }
            Ok(Ok(session)) => {
                self.apply(ConnectionAction::Approved);
                self.hold_session(Some(session.topic.clone()));
                tracing::info!(topic = %session.topic, "connected chia wallet via walletconnect");
                Ok(session)
            }
        }
    }

    async fn eager_inner(&self) -> Result<bool, WalletError> {
        let client = self.ensure_client().await?;
        Ok(self.lookup_session(client.as_ref()).await?.is_some())
    }

    async fn offer_inner(
        &self,
        request: &[Asset],
        offer: &[Asset],
    ) -> Result<SignedOffer, WalletError> {
        let _flight = self.guard.try_enter()?;
        if self.released.load(Ordering::SeqCst) {
            return Err(WalletError::NotConnected);
        }
        let client = self.ensure_client().await?;
        self.negotiator
            .negotiate(client.as_ref(), request, offer)
            .await
    }
}

fn handshake_error(err: PortError) -> WalletError {
    match err {
        PortError::Rejected(reason) => WalletError::HandshakeRejected(reason),
        other => WalletError::Channel(other.to_string()),
    }
}

#[async_trait]
impl WalletIntegration for WalletConnectIntegration {
    fn kind(&self) -> WalletKind {
        WalletKind::WalletConnect
    }

    fn name(&self) -> &'static str {
        "WalletConnect"
    }

    fn image(&self) -> &'static str {
        "/assets/xch.webp"
    }

    async fn connect(&self) -> bool {
        let _flight = match self.guard.try_enter() {
            Ok(flight) => flight,
            Err(err) => {
                report(self.notifier.as_ref(), self.name(), &err);
                return false;
            }
        };
        match self.connect_inner().await {
            Ok(_) => {
                self.notifier.notify(Notice::success("Successfully Connected"));
                true
            }
            Err(err) => {
                report(self.notifier.as_ref(), self.name(), &err);
                false
            }
        }
    }

    async fn eagerly_connect(&self) -> bool {
        match self.eager_inner().await {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(error = %err, "eager walletconnect lookup failed");
                false
            }
        }
    }

    /// Aborts a pending handshake, then waits for the running flow before releasing.
    async fn disconnect(&self) {
        self.abort.notify_waiters();
        let _flight = self.guard.enter().await;
        self.released.store(true, Ordering::SeqCst);
        let topic = self
            .session_topic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if self.disconnect_remote {
            if let (Some(topic), Some(client)) = (topic.as_deref(), self.client.get()) {
                if let Err(err) = client.disconnect(topic).await {
                    tracing::warn!(%topic, error = %err, "remote session disconnect failed");
                }
            }
        }
        self.recover_interrupted();
        self.apply(ConnectionAction::Disconnect);
    }

    async fn generate_offer(
        &self,
        request: &[Asset],
        offer: &[Asset],
    ) -> Result<SignedOffer, WalletError> {
        let result = self.offer_inner(request, offer).await;
        match &result {
            Ok(_) => self.notifier.notify(Notice::success("Offer generated")),
            Err(err) => report(self.notifier.as_ref(), self.name(), err),
        }
        result
    }
}

impl std::fmt::Debug for WalletConnectIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnectIntegration")
            .field("client", &self.client)
            .field("state", &self.state())
            .field("session_topic", &self.session_topic())
            .finish_non_exhaustive()
    }
}
