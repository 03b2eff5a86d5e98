use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CHIA_NAMESPACE: &str = "chia";
pub const CHIA_MAINNET: &str = "chia:mainnet";
pub const METHOD_CREATE_OFFER_FOR_IDS: &str = "chia_createOfferForIds";
pub const METHOD_SIGN_MESSAGE_BY_ADDRESS: &str = "chia_signMessageByAddress";

/// Wire key used for the chain's native unit (XCH) in asset delta maps.
pub const NATIVE_ASSET_KEY: &str = "";

/// One leg of a request or offer, in atomic units (mojos).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// `None` is the native currency.
    pub asset_id: Option<String>,
    pub amount: u64,
}

impl Asset {
    pub fn native(amount: u64) -> Self {
        Self {
            asset_id: None,
            amount,
        }
    }

    pub fn token(asset_id: impl Into<String>, amount: u64) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            amount,
        }
    }

    pub fn wire_key(&self) -> &str {
        self.asset_id.as_deref().unwrap_or(NATIVE_ASSET_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub asset_id: String,
    pub pair_id: String,
    pub name: String,
    pub short_name: String,
    pub image_url: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Swap,
    AddLiquidity,
    RemoveLiquidity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferLeg {
    pub token: Token,
    pub is_native: bool,
    pub amount: u64,
}

impl OfferLeg {
    pub fn to_asset(&self) -> Asset {
        if self.is_native {
            Asset::native(self.amount)
        } else {
            Asset::token(self.token.asset_id.clone(), self.amount)
        }
    }
}

/// Trade intent assembled by the UI once a form is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOfferData {
    pub pair_id: String,
    pub offer: Vec<OfferLeg>,
    pub request: Vec<OfferLeg>,
    pub action: ActionType,
}

impl GenerateOfferData {
    /// Returns `(request, offer)` in the order `generate_offer` takes them.
    pub fn to_assets(&self) -> (Vec<Asset>, Vec<Asset>) {
        let request = self.request.iter().map(OfferLeg::to_asset).collect();
        let offer = self.offer.iter().map(OfferLeg::to_asset).collect();
        (request, offer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSession {
    pub topic: String,
    pub active: bool,
    #[serde(default)]
    pub granted_methods: BTreeSet<String>,
    #[serde(default)]
    pub granted_chains: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub topic: String,
    pub pairing_topic: String,
    pub acknowledged: bool,
    #[serde(default)]
    pub namespaces: Namespaces,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub methods: Vec<String>,
    pub chains: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

pub type Namespaces = BTreeMap<String, Namespace>;

/// The namespace every Chia signer is asked to grant.
pub fn chia_required_namespaces() -> Namespaces {
    let mut namespaces = Namespaces::new();
    namespaces.insert(
        CHIA_NAMESPACE.to_owned(),
        Namespace {
            methods: vec![
                METHOD_CREATE_OFFER_FOR_IDS.to_owned(),
                METHOD_SIGN_MESSAGE_BY_ADDRESS.to_owned(),
            ],
            chains: vec![CHIA_MAINNET.to_owned()],
            events: Vec::new(),
        },
    );
    namespaces
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<String>,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "TibetSwap".to_owned(),
            description: "The first decentralized AMM running on the Chia blockchain.".to_owned(),
            url: "https://v2.tibetswap.io/".to_owned(),
            icons: vec!["https://v2.tibetswap.io/logo.jpg".to_owned()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub project_id: String,
    pub relay_url: Option<String>,
    pub metadata: AppMetadata,
    pub logger: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            project_id: "d8a8954b78975225ab6abcbc7c4c9f00".to_owned(),
            relay_url: None,
            metadata: AppMetadata::default(),
            logger: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_topic: Option<String>,
    pub required_namespaces: Namespaces,
}

/// Returned by the signer when a session is requested. `uri` is only set when a new
/// out-of-band pairing has to be established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectProposal {
    pub proposal_id: String,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub topic: String,
    pub chain_id: String,
    pub request: RpcRequest,
}

/// Signer attestation for an offer. Opaque: never transformed or validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedOffer(pub Value);

impl SignedOffer {
    /// The bech32 offer text when the signer reports it under `offer`.
    pub fn offer_text(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) => Some(s),
            other => other.get("offer").and_then(Value::as_str),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
