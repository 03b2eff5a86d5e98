mod common;

use tibet_signing_adapters::{ApprovalPolicy, WalletAdapterConfig};
use tibet_signing_core::{
    ConnectionState, NoticeLevel, SignClientPort, WalletIntegration, WalletKind,
};

use common::{approved_session, assert_error_toast, harness, harness_with, last_toast, pairing};

#[tokio::test]
async fn empty_store_presents_exactly_one_handshake() {
    let h = harness();

    assert!(h.wallet.connect().await);

    assert_eq!(h.modal.presented_count(), 1);
    assert!(h.modal.open_modals().is_empty());
    assert_eq!(h.wallet.state(), ConnectionState::SessionApproved);
    assert!(h.wallet.session_topic().is_some());

    let calls = h.client.debug_connect_calls().expect("connect calls");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].pairing_topic.is_none());
    assert!(calls[0].required_namespaces.contains_key("chia"));

    let toast = last_toast(&h.toasts);
    assert_eq!(toast.level, NoticeLevel::Success);
    assert_eq!(toast.message, "Successfully Connected");
}

#[tokio::test]
async fn active_pairing_is_resumed_without_a_modal() {
    let h = harness();
    h.client
        .debug_insert_pairing(pairing("stale", false))
        .expect("insert stale");
    h.client
        .debug_insert_pairing(pairing("live", true))
        .expect("insert live");

    assert!(h.wallet.connect().await);

    assert_eq!(h.modal.presented_count(), 0);
    let calls = h.client.debug_connect_calls().expect("connect calls");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].pairing_topic.as_deref(), Some("live"));
    assert_eq!(h.wallet.state(), ConnectionState::SessionApproved);
}

#[tokio::test]
async fn approved_session_is_reused_without_proposing() {
    let h = harness();
    h.client
        .debug_insert_session(approved_session("session-1", "live"))
        .expect("insert session");

    assert!(h.wallet.connect().await);

    assert!(h.client.debug_connect_calls().expect("calls").is_empty());
    assert_eq!(h.wallet.session_topic().as_deref(), Some("session-1"));
}

#[tokio::test]
async fn eager_connect_only_reads_the_store() {
    let h = harness();

    assert!(!h.wallet.eagerly_connect().await);
    assert_eq!(h.modal.presented_count(), 0);
    assert!(h.client.debug_connect_calls().expect("calls").is_empty());
    assert!(h.toasts.snapshot().is_empty());
    assert_eq!(h.wallet.state(), ConnectionState::ClientReady);

    h.client
        .debug_insert_session(approved_session("session-1", "live"))
        .expect("insert session");
    assert!(h.wallet.eagerly_connect().await);
    assert_eq!(h.wallet.state(), ConnectionState::SessionApproved);
    assert_eq!(h.wallet.kind(), WalletKind::WalletConnect);
}

#[tokio::test]
async fn rejected_handshake_closes_modal_and_reports() {
    let h = harness();
    h.client
        .debug_set_approval_policy(ApprovalPolicy::Reject)
        .expect("policy");

    assert!(!h.wallet.connect().await);

    assert_eq!(h.modal.presented_count(), 1);
    assert!(h.modal.open_modals().is_empty());
    assert_eq!(h.wallet.state(), ConnectionState::ClientReady);
    assert_error_toast(&h.toasts, "handshake rejected");
}

#[tokio::test]
async fn rejected_resume_falls_back_to_client_ready() {
    let h = harness();
    h.client
        .debug_insert_pairing(pairing("live", true))
        .expect("insert live");
    h.client
        .debug_set_approval_policy(ApprovalPolicy::Reject)
        .expect("policy");

    assert!(!h.wallet.connect().await);
    assert_eq!(h.modal.presented_count(), 0);
    assert_eq!(h.wallet.state(), ConnectionState::ClientReady);
}

#[tokio::test]
async fn sign_client_is_initialized_once() {
    let h = harness();

    assert!(!h.wallet.eagerly_connect().await);
    assert!(h.wallet.connect().await);
    assert!(h.wallet.eagerly_connect().await);

    assert_eq!(h.factory.init_calls(), 1);
    let options = h
        .client
        .registered_options()
        .expect("options")
        .expect("registered");
    assert_eq!(options.metadata.name, "TibetSwap");
}

#[tokio::test]
async fn failed_init_is_retried_on_next_call() {
    let h = harness();
    h.factory.debug_fail_next_inits(1);

    assert!(!h.wallet.connect().await);
    assert_eq!(h.wallet.state(), ConnectionState::NoClient);
    assert_error_toast(&h.toasts, "initialization failed");

    assert!(h.wallet.connect().await);
    assert_eq!(h.factory.init_calls(), 2);
    assert_eq!(h.wallet.state(), ConnectionState::SessionApproved);
}

#[tokio::test]
async fn disconnect_keeps_remote_session_by_default() {
    let h = harness();
    assert!(h.wallet.connect().await);

    h.wallet.disconnect().await;

    assert_eq!(h.wallet.state(), ConnectionState::ClientReady);
    assert!(h.wallet.session_topic().is_none());
    assert_eq!(h.client.sessions().await.expect("sessions").len(), 1);
}

#[tokio::test]
async fn disconnect_can_terminate_the_remote_session() {
    let h = harness_with(WalletAdapterConfig {
        walletconnect_disconnect_remote: true,
        ..WalletAdapterConfig::default()
    });
    assert!(h.wallet.connect().await);

    h.wallet.disconnect().await;

    assert!(h.client.sessions().await.expect("sessions").is_empty());
    assert!(!h.wallet.eagerly_connect().await);

    // Pairing survives, so the next connect resumes without a second modal.
    assert!(h.wallet.connect().await);
    assert_eq!(h.modal.presented_count(), 1);
}
