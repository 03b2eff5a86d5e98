#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use tibet_signing_adapters::{
    PresentedModal, QrConnectionModal, ToastQueue, WalletAdapterConfig, WalletConnectClient,
    WalletConnectClientFactory,
};
use tibet_signing_core::{
    chia_required_namespaces, Notice, NoticeLevel, PairingSession, SessionRecord,
    WalletConnectIntegration,
};

pub struct Harness {
    pub client: Arc<WalletConnectClient>,
    pub factory: Arc<WalletConnectClientFactory>,
    pub modal: QrConnectionModal,
    pub toasts: ToastQueue,
    pub wallet: Arc<WalletConnectIntegration>,
}

pub fn harness() -> Harness {
    harness_with(WalletAdapterConfig::default())
}

pub fn harness_with(config: WalletAdapterConfig) -> Harness {
    let client = Arc::new(WalletConnectClient::deterministic());
    let factory = Arc::new(WalletConnectClientFactory::shared(Arc::clone(&client)));
    let modal = QrConnectionModal::default();
    let toasts = ToastQueue::default();
    let wallet = Arc::new(WalletConnectIntegration::new(
        factory.clone(),
        Arc::new(modal.clone()),
        Arc::new(toasts.clone()),
        config.wallet_connect_options(),
    ));
    Harness {
        client,
        factory,
        modal,
        toasts,
        wallet,
    }
}

pub fn pairing(topic: &str, active: bool) -> PairingSession {
    PairingSession {
        topic: topic.to_owned(),
        active,
        granted_methods: BTreeSet::new(),
        granted_chains: BTreeSet::new(),
    }
}

pub fn approved_session(topic: &str, pairing_topic: &str) -> SessionRecord {
    SessionRecord {
        topic: topic.to_owned(),
        pairing_topic: pairing_topic.to_owned(),
        acknowledged: true,
        namespaces: chia_required_namespaces(),
    }
}

pub fn last_toast(toasts: &ToastQueue) -> Notice {
    toasts.snapshot().pop().expect("at least one toast")
}

pub fn assert_error_toast(toasts: &ToastQueue, needle: &str) {
    let toast = last_toast(toasts);
    assert_eq!(toast.level, NoticeLevel::Error, "toast: {toast:?}");
    assert!(
        toast.message.contains(needle),
        "expected {needle:?} in {:?}",
        toast.message
    );
}

/// Yields until the handshake under test has presented its modal.
pub async fn wait_for_modal(modal: &QrConnectionModal) -> PresentedModal {
    loop {
        if let Some(presented) = modal.open_modals().into_iter().next() {
            return presented;
        }
        tokio::task::yield_now().await;
    }
}
