//! Bridge between the egui shell and the signing workspace crates.
//! This must remain the only shell-facing boundary for wallet operations.
//!
//! Every operation runs on the bridge's runtime and lands in a result slot the UI polls each
//! frame; the caller-supplied `repaint` wakes the UI once the slot is filled.

use std::sync::{Arc, Mutex, PoisonError};

use tibet_signing_adapters::{
    PresentedModal, QrConnectionModal, ToastQueue, WalletAdapterConfig, WalletRegistry,
};
use tibet_signing_core::{
    GenerateOfferData, Notice, SignedOffer, WalletError, WalletIntegration, WalletKind,
};

/// Filled exactly once by the background task.
pub type ResultSlot<T> = Arc<Mutex<Option<T>>>;

pub fn take_result<T>(slot: &ResultSlot<T>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

pub struct WalletBridge {
    runtime: Arc<tokio::runtime::Runtime>,
    registry: WalletRegistry,
    modal: QrConnectionModal,
    toasts: ToastQueue,
}

impl WalletBridge {
    pub fn new(config: &WalletAdapterConfig) -> eyre::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tibet-wallet")
            .enable_all()
            .build()?;
        let modal = QrConnectionModal::default();
        let toasts = ToastQueue::default();
        let registry =
            WalletRegistry::from_config(config, Arc::new(modal.clone()), Arc::new(toasts.clone()));
        tracing::info!(
            profile = ?config.runtime_profile,
            bridge = config.walletconnect_bridge_url.as_deref().unwrap_or("deterministic"),
            "wallet bridge ready"
        );
        Ok(Self {
            runtime: Arc::new(runtime),
            registry,
            modal,
            toasts,
        })
    }

    pub fn integration(&self, kind: WalletKind) -> Arc<dyn WalletIntegration> {
        self.registry.get(kind)
    }

    pub fn connect(
        &self,
        kind: WalletKind,
        repaint: impl Fn() + Send + 'static,
    ) -> ResultSlot<bool> {
        let wallet = self.integration(kind);
        self.spawn(repaint, async move { wallet.connect().await })
    }

    pub fn eagerly_connect(
        &self,
        kind: WalletKind,
        repaint: impl Fn() + Send + 'static,
    ) -> ResultSlot<bool> {
        let wallet = self.integration(kind);
        self.spawn(repaint, async move { wallet.eagerly_connect().await })
    }

    pub fn disconnect(&self, kind: WalletKind, repaint: impl Fn() + Send + 'static) -> ResultSlot<()> {
        let wallet = self.integration(kind);
        self.spawn(repaint, async move { wallet.disconnect().await })
    }

    pub fn generate_offer(
        &self,
        kind: WalletKind,
        data: &GenerateOfferData,
        repaint: impl Fn() + Send + 'static,
    ) -> ResultSlot<Result<SignedOffer, WalletError>> {
        let wallet = self.integration(kind);
        let (request, offer) = data.to_assets();
        self.spawn(repaint, async move {
            wallet.generate_offer(&request, &offer).await
        })
    }

    pub fn open_modals(&self) -> Vec<PresentedModal> {
        self.modal.open_modals()
    }

    pub fn drain_toasts(&self) -> Vec<Notice> {
        self.toasts.drain()
    }

    fn spawn<T, F>(&self, repaint: impl Fn() + Send + 'static, task: F) -> ResultSlot<T>
    where
        T: Send + 'static,
        F: std::future::Future<Output = T> + Send + 'static,
    {
        let slot: ResultSlot<T> = Arc::new(Mutex::new(None));
        let out = Arc::clone(&slot);
        self.runtime.spawn(async move {
            let value = task.await;
            *out.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
            repaint();
        });
        slot
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tibet_signing_adapters::WalletAdapterConfig;
    use tibet_signing_core::{ActionType, GenerateOfferData, NoticeLevel, WalletError, WalletKind};

    use super::{take_result, ResultSlot, WalletBridge};
    use crate::forms::{xch_token, PairListing};

    fn wait<T>(slot: &ResultSlot<T>) -> T {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(value) = take_result(slot) {
                return value;
            }
            assert!(Instant::now() < deadline, "bridge task did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn intent() -> GenerateOfferData {
        let listing = PairListing {
            token: tibet_signing_core::Token {
                short_name: "TKX".to_owned(),
                asset_id: "TOKENX".to_owned(),
                pair_id: "pair-x".to_owned(),
                ..xch_token()
            },
            liquidity_asset_id: "lp-x".to_owned(),
        };
        crate::forms::SwapForm {
            selected: 0,
            amount_in: "0.000000001".to_owned(),
            amount_out: "0.05".to_owned(),
            ..Default::default()
        }
        .build(&[listing])
        .expect("intent")
    }

    #[test]
    fn offer_before_connect_reports_not_connected() {
        let bridge = WalletBridge::new(&WalletAdapterConfig::default()).expect("bridge");
        let result = wait(&bridge.generate_offer(WalletKind::WalletConnect, &intent(), || {}));
        assert_eq!(result, Err(WalletError::NotConnected));
        let toasts = bridge.drain_toasts();
        assert_eq!(toasts.last().expect("toast").level, NoticeLevel::Error);
    }

    #[test]
    fn connect_then_offer_through_walletconnect() {
        let bridge = WalletBridge::new(&WalletAdapterConfig::default()).expect("bridge");
        assert!(!wait(&bridge.eagerly_connect(WalletKind::WalletConnect, || {})));
        assert!(wait(&bridge.connect(WalletKind::WalletConnect, || {})));
        assert!(bridge.open_modals().is_empty());

        let data = intent();
        assert_eq!(data.action, ActionType::Swap);
        let offer = wait(&bridge.generate_offer(WalletKind::WalletConnect, &data, || {}))
            .expect("signed offer");
        assert!(offer.offer_text().is_some());

        wait(&bridge.disconnect(WalletKind::WalletConnect, || {}));
        assert!(wait(&bridge.eagerly_connect(WalletKind::WalletConnect, || {})));
    }
}
