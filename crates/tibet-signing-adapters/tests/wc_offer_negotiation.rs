mod common;

use serde_json::json;

use tibet_signing_core::{
    Asset, Namespace, NegotiationError, SessionRecord, WalletError, WalletIntegration,
    CHIA_MAINNET, METHOD_CREATE_OFFER_FOR_IDS,
};

use common::{approved_session, assert_error_toast, harness, last_toast};

#[tokio::test]
async fn offer_without_session_is_not_connected() {
    let h = harness();

    let result = h
        .wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await;

    assert_eq!(result, Err(WalletError::NotConnected));
    assert!(h.client.debug_requests().expect("requests").is_empty());
    assert_eq!(h.modal.presented_count(), 0);
    assert_error_toast(&h.toasts, "not connected");
}

#[tokio::test]
async fn local_disconnect_stops_offers_until_reconnected() {
    let h = harness();
    assert!(h.wallet.connect().await);
    h.wallet.disconnect().await;

    let result = h
        .wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await;
    assert_eq!(result, Err(WalletError::NotConnected));
    assert!(h.client.debug_requests().expect("requests").is_empty());

    // The remote session survived, so the eager lookup picks it up again.
    assert!(h.wallet.eagerly_connect().await);
    h.wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await
        .expect("offer after reconnect");
    assert_eq!(h.client.debug_requests().expect("requests").len(), 1);
}

#[tokio::test]
async fn offer_request_carries_signed_delta_map() {
    let h = harness();
    h.client
        .debug_insert_session(approved_session("session-1", "live"))
        .expect("insert session");

    let offer = h
        .wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await
        .expect("signed offer");
    assert!(offer.offer_text().expect("offer text").starts_with("offer1"));

    let requests = h.client.debug_requests().expect("requests");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].topic, "session-1");
    assert_eq!(requests[0].chain_id, CHIA_MAINNET);
    assert_eq!(requests[0].request.method, METHOD_CREATE_OFFER_FOR_IDS);
    assert_eq!(
        requests[0].request.params,
        json!({
            "offer": { "": 1000, "TOKENX": -50 },
            "driverDict": {},
            "disableJSONFormatting": true
        })
    );
    assert_eq!(last_toast(&h.toasts).message, "Offer generated");
}

#[tokio::test]
async fn liquidity_offer_spans_three_assets() {
    let h = harness();
    h.client
        .debug_insert_session(approved_session("session-1", "live"))
        .expect("insert session");

    h.wallet
        .generate_offer(
            &[Asset::token("LIQUIDITY", 10)],
            &[Asset::native(2_000), Asset::token("TOKENX", 300)],
        )
        .await
        .expect("signed offer");

    let requests = h.client.debug_requests().expect("requests");
    assert_eq!(
        requests[0].request.params["offer"],
        json!({ "": -2000, "LIQUIDITY": 10, "TOKENX": -300 })
    );
}

#[tokio::test]
async fn zero_amount_never_reaches_the_signer() {
    let h = harness();
    h.client
        .debug_insert_session(approved_session("session-1", "live"))
        .expect("insert session");

    let result = h
        .wallet
        .generate_offer(&[Asset::native(0)], &[Asset::token("TOKENX", 50)])
        .await;

    assert_eq!(
        result,
        Err(WalletError::InvalidOffer(NegotiationError::ZeroAmount(
            String::new()
        )))
    );
    assert!(h.client.debug_requests().expect("requests").is_empty());
}

#[tokio::test]
async fn signer_refusing_the_method_is_a_negotiation_error() {
    let h = harness();
    let mut session = approved_session("session-1", "live");
    session.namespaces.insert(
        "chia".to_owned(),
        Namespace {
            methods: vec!["chia_signMessageByAddress".to_owned()],
            chains: vec![CHIA_MAINNET.to_owned()],
            events: Vec::new(),
        },
    );
    h.client.debug_insert_session(session).expect("insert");

    let result = h
        .wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await;
    assert!(matches!(result, Err(WalletError::Negotiation(_))));
}

#[tokio::test]
async fn unacknowledged_session_is_ignored() {
    let h = harness();
    h.client
        .debug_insert_session(SessionRecord {
            acknowledged: false,
            ..approved_session("session-1", "live")
        })
        .expect("insert");

    let result = h
        .wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await;
    assert_eq!(result, Err(WalletError::NotConnected));
}
