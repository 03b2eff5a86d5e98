//! Browser-extension signer backend (Goby-style injected `chia` provider).
//!
//! The extension shows its own approval prompt, so no out-of-band modal is involved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Asset, Notice, SignedOffer};
use crate::integration::{
    report, InFlightGuard, IntegrationTimeouts, WaitStage, WalletError, WalletIntegration,
    WalletKind,
};
use crate::negotiator::build_offer_delta;
use crate::ports::{InjectedProviderPort, Notifier, PortError};

pub const METHOD_CONNECT: &str = "connect";
pub const METHOD_CREATE_OFFER: &str = "createOffer";
pub const METHOD_GET_ASSET_BALANCE: &str = "getAssetBalance";

pub struct ExtensionIntegration {
    provider: Arc<dyn InjectedProviderPort>,
    notifier: Arc<dyn Notifier>,
    timeouts: IntegrationTimeouts,
    connected: AtomicBool,
    guard: InFlightGuard,
}

impl ExtensionIntegration {
    pub fn new(
        provider: Arc<dyn InjectedProviderPort>,
        notifier: Arc<dyn Notifier>,
        timeouts: IntegrationTimeouts,
    ) -> Self {
        Self {
            provider,
            notifier,
            timeouts,
            connected: AtomicBool::new(false),
            guard: InFlightGuard::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn call(
        &self,
        method: &str,
        params: Value,
        stage: WaitStage,
    ) -> Result<Value, WalletError> {
        let limit = match stage {
            WaitStage::ClientInit | WaitStage::BalanceLookup => self.timeouts.init,
            WaitStage::Approval => self.timeouts.approval,
            WaitStage::OfferRequest => self.timeouts.request,
        };
        tokio::time::timeout(limit, self.provider.request(method, params))
            .await
            .map_err(|_| WalletError::Timeout(stage))?
            .map_err(|err| match (stage, err) {
                (WaitStage::Approval, PortError::Rejected(reason)) => {
                    WalletError::HandshakeRejected(reason)
                }
                (WaitStage::OfferRequest, err) => WalletError::from_port(err),
                (WaitStage::BalanceLookup, err) => {
                    WalletError::Channel(format!("balance lookup failed: {err}"))
                }
                (_, err) => WalletError::Channel(err.to_string()),
            })
    }

    async fn eager_inner(&self) -> Result<bool, WalletError> {
        let result = self
            .call(
                METHOD_CONNECT,
                serde_json::json!({ "eager": true }),
                WaitStage::ClientInit,
            )
            .await?;
        let connected = truthy(&result);
        self.connected.store(connected, Ordering::SeqCst);
        Ok(connected)
    }

    async fn connect_inner(&self) -> Result<(), WalletError> {
        if self.eager_inner().await? {
            tracing::info!("extension wallet already authorized");
            return Ok(());
        }
        let result = self
            .call(METHOD_CONNECT, serde_json::json!({}), WaitStage::Approval)
            .await?;
        if !truthy(&result) {
            return Err(WalletError::HandshakeRejected(
                "extension declined the connection".to_owned(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn offer_inner(
        &self,
        request: &[Asset],
        offer: &[Asset],
    ) -> Result<SignedOffer, WalletError> {
        let _flight = self.guard.try_enter()?;
        if !self.eager_inner().await? {
            return Err(WalletError::NotConnected);
        }
        // Same leg rules as the delta map even though the wire format differs.
        build_offer_delta(request, offer)?;
        let params = serde_json::json!({
            "offerAssets": extension_assets(offer),
            "requestAssets": extension_assets(request),
        });
        let result = self
            .call(METHOD_CREATE_OFFER, params, WaitStage::OfferRequest)
            .await?;
        Ok(SignedOffer(result))
    }
}

fn extension_assets(assets: &[Asset]) -> Vec<Value> {
    assets
        .iter()
        .map(|asset| {
            serde_json::json!({
                "assetId": asset.wire_key(),
                "amount": asset.amount,
            })
        })
        .collect()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn parse_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl WalletIntegration for ExtensionIntegration {
    fn kind(&self) -> WalletKind {
        WalletKind::Extension
    }

    fn name(&self) -> &'static str {
        "Goby"
    }

    fn image(&self) -> &'static str {
        "/assets/goby.webp"
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
            Ok(()) => {
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
            Ok(connected) => connected,
            Err(err) => {
                tracing::debug!(error = %err, "eager extension lookup failed");
                false
            }
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
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

    async fn get_balance(&self, asset_id: Option<&str>) -> Result<Option<u64>, WalletError> {
        let kind = match asset_id {
            Some(_) => Value::from("cat"),
            None => Value::Null,
        };
        let params = serde_json::json!({ "type": kind, "assetId": asset_id });
        let result = self
            .call(METHOD_GET_ASSET_BALANCE, params, WaitStage::BalanceLookup)
            .await?;
        Ok(result.get("spendable").and_then(parse_amount))
    }
}

impl std::fmt::Debug for ExtensionIntegration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionIntegration")
            .field("connected", &self.is_connected())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
