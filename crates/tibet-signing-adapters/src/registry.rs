use std::sync::Arc;

use tibet_signing_core::{
    ConnectionPresenter, ExtensionIntegration, InjectedProviderPort, Notifier, SignClientFactory,
    WalletConnectIntegration, WalletIntegration, WalletKind,
};

use crate::{ExtensionProviderAdapter, WalletAdapterConfig, WalletConnectClientFactory};

/// One integration instance per backend for the life of the process.
#[derive(Clone)]
pub struct WalletRegistry {
    walletconnect: Arc<WalletConnectIntegration>,
    extension: Arc<ExtensionIntegration>,
}

impl WalletRegistry {
    pub fn from_config(
        config: &WalletAdapterConfig,
        presenter: Arc<dyn ConnectionPresenter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let factory: Arc<dyn SignClientFactory> =
            Arc::new(WalletConnectClientFactory::with_config(config.clone()));
        let provider: Arc<dyn InjectedProviderPort> =
            Arc::new(ExtensionProviderAdapter::with_config(config));
        Self::with_ports(config, factory, provider, presenter, notifier)
    }

    pub fn with_ports(
        config: &WalletAdapterConfig,
        factory: Arc<dyn SignClientFactory>,
        provider: Arc<dyn InjectedProviderPort>,
        presenter: Arc<dyn ConnectionPresenter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let walletconnect = WalletConnectIntegration::new(
            factory,
            presenter,
            Arc::clone(&notifier),
            config.wallet_connect_options(),
        );
        let extension = ExtensionIntegration::new(provider, notifier, config.timeouts());
        Self {
            walletconnect: Arc::new(walletconnect),
            extension: Arc::new(extension),
        }
    }

    pub fn get(&self, kind: WalletKind) -> Arc<dyn WalletIntegration> {
        match kind {
            WalletKind::WalletConnect => self.walletconnect.clone(),
            WalletKind::Extension => self.extension.clone(),
        }
    }

    pub fn all(&self) -> Vec<Arc<dyn WalletIntegration>> {
        vec![self.get(WalletKind::WalletConnect), self.get(WalletKind::Extension)]
    }

    pub fn walletconnect(&self) -> &Arc<WalletConnectIntegration> {
        &self.walletconnect
    }

    pub fn extension(&self) -> &Arc<ExtensionIntegration> {
        &self.extension
    }
}

impl std::fmt::Debug for WalletRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRegistry")
            .field("walletconnect", &self.walletconnect)
            .field("extension", &self.extension)
            .finish()
    }
}
