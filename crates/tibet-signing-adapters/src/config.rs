use std::time::Duration;

use tibet_signing_core::{
    chia_required_namespaces, AppMetadata, ClientOptions, IntegrationTimeouts,
    WalletConnectOptions, CHIA_MAINNET,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub walletconnect_bridge_url: Option<String>,
    pub walletconnect_project_id: String,
    pub walletconnect_relay_url: Option<String>,
    pub walletconnect_disconnect_remote: bool,
    pub extension_proxy_url: Option<String>,
    pub init_timeout_ms: u64,
    pub approval_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub chain_id: String,
    pub metadata: AppMetadata,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            walletconnect_bridge_url: None,
            walletconnect_project_id: ClientOptions::default().project_id,
            walletconnect_relay_url: None,
            walletconnect_disconnect_remote: false,
            extension_proxy_url: None,
            init_timeout_ms: 15_000,
            approval_timeout_ms: 5 * 60 * 1000,
            request_timeout_ms: 5 * 60 * 1000,
            http_timeout_ms: 15_000,
            chain_id: CHIA_MAINNET.to_owned(),
            metadata: AppMetadata::default(),
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unknown or malformed values keep the
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(profile) = get("TIBET_RUNTIME_PROFILE") {
            cfg.runtime_profile = match profile.to_ascii_lowercase().as_str() {
                "production" | "prod" => RuntimeProfile::Production,
                _ => RuntimeProfile::Development,
            };
        }
        cfg.walletconnect_bridge_url = get("TIBET_WC_BRIDGE_URL");
        if let Some(project_id) = get("TIBET_WC_PROJECT_ID") {
            cfg.walletconnect_project_id = project_id;
        }
        cfg.walletconnect_relay_url = get("TIBET_WC_RELAY_URL");
        if let Some(flag) = get("TIBET_WC_DISCONNECT_REMOTE") {
            cfg.walletconnect_disconnect_remote = parse_flag(&flag);
        }
        cfg.extension_proxy_url = get("TIBET_EXTENSION_PROXY_URL");
        read_ms(&get, "TIBET_INIT_TIMEOUT_MS", &mut cfg.init_timeout_ms);
        read_ms(&get, "TIBET_APPROVAL_TIMEOUT_MS", &mut cfg.approval_timeout_ms);
        read_ms(&get, "TIBET_REQUEST_TIMEOUT_MS", &mut cfg.request_timeout_ms);
        read_ms(&get, "TIBET_HTTP_TIMEOUT_MS", &mut cfg.http_timeout_ms);
        cfg
    }

    /// Production never falls back to the deterministic in-process runtimes.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn timeouts(&self) -> IntegrationTimeouts {
        IntegrationTimeouts {
            init: Duration::from_millis(self.init_timeout_ms),
            approval: Duration::from_millis(self.approval_timeout_ms),
            request: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            project_id: self.walletconnect_project_id.clone(),
            relay_url: self.walletconnect_relay_url.clone(),
            metadata: self.metadata.clone(),
            logger: "info".to_owned(),
        }
    }

    pub fn wallet_connect_options(&self) -> WalletConnectOptions {
        WalletConnectOptions {
            client: self.client_options(),
            required_namespaces: chia_required_namespaces(),
            chain_id: self.chain_id.clone(),
            timeouts: self.timeouts(),
            disconnect_remote: self.walletconnect_disconnect_remote,
        }
    }
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn read_ms(get: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut u64) {
    if let Some(raw) = get(key) {
        match raw.parse() {
            Ok(ms) => *slot = ms,
            Err(e) => tracing::warn!(key, value = %raw, error = %e, "ignoring malformed timeout"),
        }
    }
}
