//! WalletConnect sign-client runtimes.
//!
//! `Bridge` talks to a local HTTP bridge that hosts the relay SDK. `Deterministic` keeps the
//! pairing and session stores in memory so the app and tests run without a relay; it is never
//! selected under the production profile.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use tibet_signing_core::{
    ClientOptions, ConnectParams, ConnectProposal, Namespaces, PairingSession, PortError,
    SessionRecord, SessionRequest, SignClientFactory, SignClientPort,
};

use crate::deterministic::{deterministic_offer, random_hex32};
use crate::WalletAdapterConfig;

/// How the deterministic runtime answers session proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApprovalPolicy {
    #[default]
    Approve,
    Reject,
    /// Never answers, like a signer that scanned nothing.
    Hold,
}

#[derive(Debug, Clone)]
pub struct WalletConnectClient {
    mode: ClientMode,
    state: Arc<Mutex<ClientState>>,
}

#[derive(Debug, Clone)]
enum ClientMode {
    Disabled(String),
    Deterministic,
    Bridge(BridgeRuntime),
}

#[derive(Debug, Clone)]
struct BridgeRuntime {
    base_url: String,
    client: reqwest::Client,
    http_timeout: Duration,
}

#[derive(Debug, Clone)]
struct PendingProposal {
    pairing_topic: String,
    namespaces: Namespaces,
}

#[derive(Debug, Default)]
struct ClientState {
    registered: Option<ClientOptions>,
    pairings: Vec<PairingSession>,
    sessions: Vec<SessionRecord>,
    proposals: HashMap<String, PendingProposal>,
    approval_policy: ApprovalPolicy,
    proposal_seq: u64,
    request_seq: u64,
    // Inspection logs; only the in-process runtime records them.
    connect_calls: Vec<ConnectParams>,
    requests: Vec<SessionRequest>,
}

impl Default for WalletConnectClient {
    fn default() -> Self {
        Self::with_config(&WalletAdapterConfig::from_env())
    }
}

impl WalletConnectClient {
    pub fn with_config(config: &WalletAdapterConfig) -> Self {
        let mode = match config.walletconnect_bridge_url.as_deref() {
            Some(base_url) => match reqwest::Client::builder().build() {
                Ok(client) => ClientMode::Bridge(BridgeRuntime {
                    base_url: base_url.trim_end_matches('/').to_owned(),
                    client,
                    http_timeout: Duration::from_millis(config.http_timeout_ms),
                }),
                Err(e) if config.strict_runtime_required() => ClientMode::Disabled(format!(
                    "failed to initialize walletconnect bridge client in production profile: {e}"
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "walletconnect bridge unavailable, using deterministic runtime");
                    ClientMode::Deterministic
                }
            },
            None if config.strict_runtime_required() => ClientMode::Disabled(
                "walletconnect bridge URL not configured in production runtime profile".to_owned(),
            ),
            None => ClientMode::Deterministic,
        };
        Self {
            mode,
            state: Arc::new(Mutex::new(ClientState::default())),
        }
    }

    /// In-memory runtime regardless of configuration.
    pub fn deterministic() -> Self {
        Self {
            mode: ClientMode::Deterministic,
            state: Arc::new(Mutex::new(ClientState::default())),
        }
    }

    pub fn runtime_name(&self) -> &'static str {
        match self.mode {
            ClientMode::Disabled(_) => "disabled",
            ClientMode::Deterministic => "deterministic",
            ClientMode::Bridge(_) => "bridge",
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ClientMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClientState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("wc lock poisoned: {e}")))
    }

    /// Equivalent of the SDK's `SignClient.init`.
    pub async fn register(&self, options: &ClientOptions) -> Result<(), PortError> {
        self.check_mode()?;
        if let ClientMode::Bridge(bridge) = &self.mode {
            bridge.post_empty("/init", options).await?;
        }
        self.lock()?.registered = Some(options.clone());
        Ok(())
    }

    pub fn registered_options(&self) -> Result<Option<ClientOptions>, PortError> {
        Ok(self.lock()?.registered.clone())
    }

    pub fn debug_set_approval_policy(&self, policy: ApprovalPolicy) -> Result<(), PortError> {
        self.lock()?.approval_policy = policy;
        Ok(())
    }

    pub fn debug_insert_pairing(&self, pairing: PairingSession) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.pairings.retain(|p| p.topic != pairing.topic);
        g.pairings.push(pairing);
        Ok(())
    }

    pub fn debug_insert_session(&self, session: SessionRecord) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.sessions.retain(|s| s.topic != session.topic);
        g.sessions.push(session);
        Ok(())
    }

    pub fn debug_connect_calls(&self) -> Result<Vec<ConnectParams>, PortError> {
        Ok(self.lock()?.connect_calls.clone())
    }

    pub fn debug_requests(&self) -> Result<Vec<SessionRequest>, PortError> {
        Ok(self.lock()?.requests.clone())
    }

    fn deterministic_connect(&self, params: ConnectParams) -> Result<ConnectProposal, PortError> {
        let mut g = self.lock()?;
        g.connect_calls.push(params.clone());
        g.proposal_seq = g.proposal_seq.saturating_add(1);
        let proposal_id = format!("proposal-{}", g.proposal_seq);

        let (pairing_topic, uri) = match params.pairing_topic {
            Some(topic) => {
                let known = g.pairings.iter().any(|p| p.topic == topic && p.active);
                if !known {
                    return Err(PortError::NotFound(format!("wc pairing missing: {topic}")));
                }
                (topic, None)
            }
            None => {
                let topic = random_hex32()?;
                let sym_key = random_hex32()?;
                let uri = format!("wc:{topic}@2?relay-protocol=irn&symKey={sym_key}");
                g.pairings.push(PairingSession {
                    topic: topic.clone(),
                    active: false,
                    granted_methods: Default::default(),
                    granted_chains: Default::default(),
                });
                (topic, Some(uri))
            }
        };
        g.proposals.insert(
            proposal_id.clone(),
            PendingProposal {
                pairing_topic,
                namespaces: params.required_namespaces,
            },
        );
        Ok(ConnectProposal { proposal_id, uri })
    }

    /// `Ok(None)` means the proposal is held open.
    fn deterministic_approval(
        &self,
        proposal: &ConnectProposal,
    ) -> Result<Option<SessionRecord>, PortError> {
        let mut g = self.lock()?;
        let policy = g.approval_policy;
        if policy == ApprovalPolicy::Hold {
            return Ok(None);
        }
        let pending = g.proposals.remove(&proposal.proposal_id).ok_or_else(|| {
            PortError::NotFound(format!("wc proposal missing: {}", proposal.proposal_id))
        })?;
        if policy == ApprovalPolicy::Reject {
            return Err(PortError::Rejected("User rejected.".to_owned()));
        }

        if let Some(pairing) = g
            .pairings
            .iter_mut()
            .find(|p| p.topic == pending.pairing_topic)
        {
            pairing.active = true;
            for namespace in pending.namespaces.values() {
                pairing.granted_methods.extend(namespace.methods.iter().cloned());
                pairing.granted_chains.extend(namespace.chains.iter().cloned());
            }
        }
        let session = SessionRecord {
            topic: random_hex32()?,
            pairing_topic: pending.pairing_topic,
            acknowledged: true,
            namespaces: pending.namespaces,
        };
        g.sessions.push(session.clone());
        Ok(Some(session))
    }

    fn deterministic_request(&self, request: SessionRequest) -> Result<Value, PortError> {
        let mut g = self.lock()?;
        let session = g
            .sessions
            .iter()
            .find(|s| s.topic == request.topic && s.acknowledged)
            .ok_or_else(|| PortError::NotFound(format!("wc session missing: {}", request.topic)))?;
        let granted = session.namespaces.values().any(|ns| {
            ns.methods.contains(&request.request.method) && ns.chains.contains(&request.chain_id)
        });
        if !granted {
            return Err(PortError::Policy(format!(
                "method {} not granted on {}",
                request.request.method, request.chain_id
            )));
        }
        let offer = deterministic_offer(&request.request.method, &request.request.params)?;
        g.request_seq = g.request_seq.saturating_add(1);
        let id = g.request_seq;
        g.requests.push(request);
        Ok(serde_json::json!({ "id": id, "offer": offer }))
    }

    fn deterministic_disconnect(&self, topic: &str) -> Result<(), PortError> {
        let mut g = self.lock()?;
        let before = g.sessions.len();
        g.sessions.retain(|s| s.topic != topic);
        if g.sessions.len() == before {
            return Err(PortError::NotFound(format!("wc session missing: {topic}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SignClientPort for WalletConnectClient {
    async fn pairings(&self) -> Result<Vec<PairingSession>, PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => Ok(self.lock()?.pairings.clone()),
            ClientMode::Bridge(bridge) => bridge.get("/pairings").await,
        }
    }

    async fn sessions(&self) -> Result<Vec<SessionRecord>, PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => Ok(self.lock()?.sessions.clone()),
            ClientMode::Bridge(bridge) => bridge.get("/sessions").await,
        }
    }

    async fn connect(&self, params: ConnectParams) -> Result<ConnectProposal, PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => self.deterministic_connect(params),
            ClientMode::Bridge(bridge) => bridge.post("/connect", &params, true).await,
        }
    }

    async fn approval(&self, proposal: &ConnectProposal) -> Result<SessionRecord, PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => match self.deterministic_approval(proposal)? {
                Some(session) => Ok(session),
                None => std::future::pending().await,
            },
            ClientMode::Bridge(bridge) => {
                let path = format!("/approval/{}", proposal.proposal_id);
                bridge.post(&path, &serde_json::json!({}), false).await
            }
        }
    }

    async fn request(&self, request: SessionRequest) -> Result<Value, PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => self.deterministic_request(request),
            ClientMode::Bridge(bridge) => bridge.post("/request", &request, false).await,
        }
    }

    async fn disconnect(&self, topic: &str) -> Result<(), PortError> {
        match &self.mode {
            ClientMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ClientMode::Deterministic => self.deterministic_disconnect(topic),
            ClientMode::Bridge(bridge) => {
                let path = format!("/session/{topic}/disconnect");
                bridge.post_empty(&path, &serde_json::json!({})).await
            }
        }
    }
}

impl BridgeRuntime {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.http_timeout)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("wc bridge request failed: {e}")))?;
        decode(response).await
    }

    /// Long-polling calls (`bounded == false`) leave the deadline to the caller.
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bounded: bool,
    ) -> Result<T, PortError> {
        let mut builder = self.client.post(self.url(path)).json(body);
        if bounded {
            builder = builder.timeout(self.http_timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("wc bridge request failed: {e}")))?;
        decode(response).await
    }

    async fn post_empty<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), PortError> {
        let _: Value = self.post(path, body, true).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PortError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PortError::Transport(format!("wc bridge body read failed: {e}")))?;
    if !status.is_success() {
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| body.to_string());
        let rejected = status == reqwest::StatusCode::FORBIDDEN
            || body.get("code").and_then(Value::as_str) == Some("rejected");
        return Err(if rejected {
            PortError::Rejected(message)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            PortError::NotFound(message)
        } else {
            PortError::Transport(format!("wc bridge status {status}: {message}"))
        });
    }
    // Empty 2xx bodies decode as null.
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text)
        .map_err(|e| PortError::Transport(format!("wc bridge json decode failed: {e}")))
}

/// Hands out sign clients to [`tibet_signing_core::SignerClient`].
#[derive(Debug)]
pub struct WalletConnectClientFactory {
    config: WalletAdapterConfig,
    shared: Option<Arc<WalletConnectClient>>,
    init_calls: AtomicUsize,
    failing_inits: AtomicUsize,
}

impl WalletConnectClientFactory {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        Self {
            config,
            shared: None,
            init_calls: AtomicUsize::new(0),
            failing_inits: AtomicUsize::new(0),
        }
    }

    /// Always initializes the given client, so callers can keep a handle on its stores.
    pub fn shared(client: Arc<WalletConnectClient>) -> Self {
        Self {
            config: WalletAdapterConfig::default(),
            shared: Some(client),
            init_calls: AtomicUsize::new(0),
            failing_inits: AtomicUsize::new(0),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// The next `count` inits fail with a transport error.
    pub fn debug_fail_next_inits(&self, count: usize) {
        self.failing_inits.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignClientFactory for WalletConnectClientFactory {
    async fn init(&self, options: &ClientOptions) -> Result<Arc<dyn SignClientPort>, PortError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_inits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(PortError::Transport("relay unreachable".to_owned()));
        }

        let client = match &self.shared {
            Some(client) => Arc::clone(client),
            None => Arc::new(WalletConnectClient::with_config(&self.config)),
        };
        client.register(options).await?;
        tracing::info!(runtime = client.runtime_name(), "walletconnect sign client ready");
        let client: Arc<dyn SignClientPort> = client;
        Ok(client)
    }
}
