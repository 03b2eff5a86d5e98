use std::sync::Arc;

use serde_json::json;

use tibet_signing_adapters::{ExtensionProviderAdapter, ToastQueue};
use tibet_signing_core::{
    Asset, ExtensionIntegration, IntegrationTimeouts, NoticeLevel, WalletError,
    WalletIntegration, WalletKind,
};

fn extension() -> (Arc<ExtensionProviderAdapter>, ToastQueue, ExtensionIntegration) {
    let provider = Arc::new(ExtensionProviderAdapter::deterministic());
    let toasts = ToastQueue::default();
    let wallet = ExtensionIntegration::new(
        provider.clone(),
        Arc::new(toasts.clone()),
        IntegrationTimeouts::default(),
    );
    (provider, toasts, wallet)
}

#[tokio::test]
async fn connect_then_offer_uses_extension_wire_format() {
    let (provider, toasts, wallet) = extension();
    assert_eq!(wallet.kind(), WalletKind::Extension);
    assert_eq!(wallet.name(), "Goby");

    assert!(!wallet.eagerly_connect().await);
    assert!(wallet.connect().await);
    assert!(wallet.is_connected());

    let offer = wallet
        .generate_offer(&[Asset::token("TOKENX", 50)], &[Asset::native(1_000)])
        .await
        .expect("offer");
    assert!(offer.offer_text().expect("text").starts_with("offer1"));

    let requests = provider.debug_requests().expect("requests");
    let (method, params) = requests.last().expect("create offer");
    assert_eq!(method, "createOffer");
    assert_eq!(
        params,
        &json!({
            "offerAssets": [{ "assetId": "", "amount": 1000 }],
            "requestAssets": [{ "assetId": "TOKENX", "amount": 50 }],
        })
    );
    assert_eq!(toasts.snapshot().last().expect("toast").message, "Offer generated");
}

#[tokio::test]
async fn declined_connect_reports_rejection() {
    let (provider, toasts, wallet) = extension();
    provider
        .debug_set_connect_approval(false)
        .expect("configure");

    assert!(!wallet.connect().await);
    assert!(!wallet.is_connected());
    let toast = toasts.snapshot().pop().expect("toast");
    assert_eq!(toast.level, NoticeLevel::Error);
    assert!(toast.message.contains("handshake rejected"));
}

#[tokio::test]
async fn offer_before_authorization_is_not_connected() {
    let (provider, _toasts, wallet) = extension();

    let result = wallet
        .generate_offer(&[Asset::native(1_000)], &[Asset::token("TOKENX", 50)])
        .await;
    assert_eq!(result, Err(WalletError::NotConnected));

    let methods: Vec<String> = provider
        .debug_requests()
        .expect("requests")
        .into_iter()
        .map(|(method, _)| method)
        .collect();
    assert_eq!(methods, vec!["connect"]);
}

#[tokio::test]
async fn eager_connect_picks_up_prior_authorization() {
    let (provider, toasts, wallet) = extension();
    provider.debug_authorize().expect("authorize");

    assert!(wallet.eagerly_connect().await);
    assert!(toasts.snapshot().is_empty());
}

#[tokio::test]
async fn balances_are_read_in_atomic_units() {
    let (provider, _toasts, wallet) = extension();
    provider.debug_set_balance(None, 5_000).expect("xch");
    provider
        .debug_set_balance(Some("TOKENX"), 42)
        .expect("cat");

    assert_eq!(wallet.get_balance(None).await, Ok(Some(5_000)));
    assert_eq!(wallet.get_balance(Some("TOKENX")).await, Ok(Some(42)));
    assert_eq!(wallet.get_balance(Some("OTHER")).await, Ok(Some(0)));
}
