use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use tibet_signing_core::{InjectedProviderPort, PortError, NATIVE_ASSET_KEY};

use crate::deterministic::deterministic_offer;
use crate::WalletAdapterConfig;

/// Injected `window.chia` provider. Natively the extension is reached through a JSON-RPC proxy;
/// without one (outside production) an in-memory wallet answers.
#[derive(Debug, Clone)]
pub struct ExtensionProviderAdapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
    http_timeout: Duration,
}

#[derive(Debug)]
struct ProviderState {
    authorized: bool,
    approve_connect: bool,
    balances: HashMap<String, u64>,
    request_seq: u64,
    requests: Vec<(String, Value)>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            authorized: false,
            approve_connect: true,
            balances: HashMap::new(),
            request_seq: 0,
            requests: Vec::new(),
        }
    }
}

impl Default for ExtensionProviderAdapter {
    fn default() -> Self {
        Self::with_config(&WalletAdapterConfig::from_env())
    }
}

impl ExtensionProviderAdapter {
    pub fn with_config(config: &WalletAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.extension_proxy_url {
            // No client-wide timeout: prompts the user answers are bounded by the integration.
            match reqwest::Client::builder().build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                    http_timeout: Duration::from_millis(config.http_timeout_ms),
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize extension proxy client in production profile: {e}"
                        ))
                    } else {
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "extension proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_set_connect_approval(&self, approve: bool) -> Result<(), PortError> {
        self.lock()?.approve_connect = approve;
        Ok(())
    }

    pub fn debug_authorize(&self) -> Result<(), PortError> {
        self.lock()?.authorized = true;
        Ok(())
    }

    /// `None` sets the native XCH balance.
    pub fn debug_set_balance(&self, asset_id: Option<&str>, amount: u64) -> Result<(), PortError> {
        let key = asset_id.unwrap_or(NATIVE_ASSET_KEY).to_owned();
        self.lock()?.balances.insert(key, amount);
        Ok(())
    }

    pub fn debug_requests(&self) -> Result<Vec<(String, Value)>, PortError> {
        Ok(self.lock()?.requests.clone())
    }

    fn deterministic_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let mut g = self.lock()?;
        g.requests.push((method.to_owned(), params.clone()));
        match method {
            "connect" => {
                let eager = params.get("eager").and_then(Value::as_bool).unwrap_or(false);
                if eager {
                    return Ok(Value::Bool(g.authorized));
                }
                if !g.approve_connect {
                    return Err(PortError::Rejected("User rejected the request.".to_owned()));
                }
                g.authorized = true;
                Ok(Value::Bool(true))
            }
            "createOffer" => {
                if !g.authorized {
                    return Err(PortError::Policy("extension not authorized".to_owned()));
                }
                g.request_seq = g.request_seq.saturating_add(1);
                Ok(serde_json::json!({
                    "id": g.request_seq,
                    "offer": deterministic_offer(method, &params)?,
                }))
            }
            "getAssetBalance" => {
                let key = params
                    .get("assetId")
                    .and_then(Value::as_str)
                    .unwrap_or(NATIVE_ASSET_KEY);
                let amount = g.balances.get(key).copied().unwrap_or(0);
                Ok(serde_json::json!({
                    "confirmed": amount,
                    "spendable": amount,
                    "spendableCoinCount": u64::from(amount > 0),
                }))
            }
            other => Err(PortError::NotFound(format!(
                "extension method unsupported: {other}"
            ))),
        }
    }

    async fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented(
                    "extension proxy runtime not enabled",
                ))
            }
        };

        let bounded = is_silent_call(method, &params);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let mut builder = proxy.client.post(&proxy.base_url).json(&payload);
        if bounded {
            builder = builder.timeout(proxy.http_timeout);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("extension proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("extension proxy json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "extension proxy status {}: {}",
                status, body
            )));
        }
        if let Some(err) = body.get("error") {
            // 4001 is the provider-wide "user rejected" code.
            if err.get("code").and_then(Value::as_i64) == Some(4001) {
                let message = err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("user rejected")
                    .to_owned();
                return Err(PortError::Rejected(message));
            }
            return Err(PortError::Transport(format!(
                "extension proxy returned error: {err}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("extension proxy missing result".to_owned()))
    }
}

/// Calls the extension answers without prompting the user: eager `connect` and balance reads.
fn is_silent_call(method: &str, params: &Value) -> bool {
    match method {
        "getAssetBalance" => true,
        "connect" => params.get("eager").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl InjectedProviderPort for ExtensionProviderAdapter {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => self.deterministic_call(method, params),
            ProviderMode::Proxy(_) => self.proxy_call(method, params).await,
        }
    }
}
