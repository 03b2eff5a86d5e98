use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    Asset, RpcRequest, SessionRecord, SessionRequest, SignedOffer, CHIA_MAINNET,
    METHOD_CREATE_OFFER_FOR_IDS,
};
use crate::integration::{WaitStage, WalletError};
use crate::ports::SignClientPort;
use crate::session::canonical_session;

/// Asset id (`""` for native) to signed amount: negative is given, positive is taken.
pub type OfferDeltaMap = BTreeMap<String, i64>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("asset {0:?} has a zero amount")]
    ZeroAmount(String),
    #[error("asset {0:?} appears more than once; net the legs before submitting")]
    DuplicateAsset(String),
    #[error("amount {amount} for asset {asset:?} exceeds the signed range")]
    AmountOverflow { asset: String, amount: u64 },
}

pub fn build_offer_delta(
    request: &[Asset],
    offer: &[Asset],
) -> Result<OfferDeltaMap, NegotiationError> {
    let mut delta = OfferDeltaMap::new();
    let legs = request
        .iter()
        .map(|asset| (asset, 1i64))
        .chain(offer.iter().map(|asset| (asset, -1i64)));

    for (asset, sign) in legs {
        let key = asset.wire_key().to_owned();
        if asset.amount == 0 {
            return Err(NegotiationError::ZeroAmount(key));
        }
        let amount =
            i64::try_from(asset.amount).map_err(|_| NegotiationError::AmountOverflow {
                asset: key.clone(),
                amount: asset.amount,
            })?;
        if delta.contains_key(&key) {
            return Err(NegotiationError::DuplicateAsset(key));
        }
        delta.insert(key, sign * amount);
    }

    Ok(delta)
}

/// `chia_createOfferForIds` params; `driverDict` stays empty until non-standard asset
/// drivers are supported.
pub fn create_offer_params(delta: &OfferDeltaMap) -> Value {
    serde_json::json!({
        "offer": delta,
        "driverDict": {},
        "disableJSONFormatting": true,
    })
}

#[derive(Debug, Clone)]
pub struct OfferNegotiator {
    pub chain_id: String,
    pub method: String,
    pub request_timeout: Duration,
}

impl Default for OfferNegotiator {
    fn default() -> Self {
        Self {
            chain_id: CHIA_MAINNET.to_owned(),
            method: METHOD_CREATE_OFFER_FOR_IDS.to_owned(),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl OfferNegotiator {
    pub fn session_request(&self, topic: &str, delta: &OfferDeltaMap) -> SessionRequest {
        SessionRequest {
            topic: topic.to_owned(),
            chain_id: self.chain_id.clone(),
            request: RpcRequest {
                method: self.method.clone(),
                params: create_offer_params(delta),
            },
        }
    }

    /// Finds the approved session and round-trips one offer request through it.
    pub async fn negotiate(
        &self,
        client: &dyn SignClientPort,
        request: &[Asset],
        offer: &[Asset],
    ) -> Result<SignedOffer, WalletError> {
        let sessions = client
            .sessions()
            .await
            .map_err(|e| WalletError::Negotiation(format!("session lookup failed: {e}")))?;
        let session: &SessionRecord =
            canonical_session(&sessions).ok_or(WalletError::NotConnected)?;

        let delta = build_offer_delta(request, offer)?;
        let wire = self.session_request(&session.topic, &delta);
        tracing::info!(topic = %session.topic, legs = delta.len(), "submitting offer request");

        let result = tokio::time::timeout(self.request_timeout, client.request(wire))
            .await
            .map_err(|_| WalletError::Timeout(WaitStage::OfferRequest))?
            .map_err(WalletError::from_port)?;
        Ok(SignedOffer(result))
    }
}

#[cfg(test)]
mod tests {
    use super::{build_offer_delta, NegotiationError};
    use crate::domain::Asset;

    #[test]
    fn native_request_and_token_offer_produce_signed_deltas() {
        let delta = build_offer_delta(&[Asset::native(1000)], &[Asset::token("TOKENX", 50)])
            .expect("delta");
        assert_eq!(delta.len(), 2);
        assert_eq!(delta.get(""), Some(&1000));
        assert_eq!(delta.get("TOKENX"), Some(&-50));
    }

    #[test]
    fn one_sided_lists_are_well_formed() {
        let gift = build_offer_delta(&[], &[Asset::native(7)]).expect("gift");
        assert_eq!(gift.get(""), Some(&-7));

        let ask = build_offer_delta(&[Asset::token("a", 1), Asset::token("b", 2)], &[])
            .expect("ask");
        assert_eq!(ask.get("a"), Some(&1));
        assert_eq!(ask.get("b"), Some(&2));

        assert!(build_offer_delta(&[], &[]).expect("empty").is_empty());
    }

    #[test]
    fn same_asset_on_both_sides_is_not_netted() {
        let err = build_offer_delta(&[Asset::token("a", 5)], &[Asset::token("a", 3)])
            .expect_err("duplicate");
        assert_eq!(err, NegotiationError::DuplicateAsset("a".to_owned()));
    }

    #[test]
    fn zero_and_oversized_amounts_are_rejected() {
        let err = build_offer_delta(&[Asset::native(0)], &[]).expect_err("zero");
        assert_eq!(err, NegotiationError::ZeroAmount(String::new()));

        let err = build_offer_delta(&[], &[Asset::token("big", u64::MAX)]).expect_err("overflow");
        assert!(matches!(err, NegotiationError::AmountOverflow { .. }));
    }
}
