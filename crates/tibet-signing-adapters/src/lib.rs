pub mod config;
mod deterministic;
pub mod extension_provider;
pub mod modal;
pub mod notify;
pub mod qr;
pub mod registry;
pub mod sign_client;

pub use config::{RuntimeProfile, WalletAdapterConfig};
pub use extension_provider::ExtensionProviderAdapter;
pub use modal::{PresentedModal, QrConnectionModal};
pub use notify::{ToastQueue, TracingNotifier};
pub use qr::{render_matrix, render_text_qr, QrMatrix, QrRenderError};
pub use registry::WalletRegistry;
pub use sign_client::{ApprovalPolicy, WalletConnectClient, WalletConnectClientFactory};
