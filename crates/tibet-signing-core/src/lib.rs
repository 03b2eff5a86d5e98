pub mod domain;
pub mod extension;
pub mod integration;
pub mod modal;
pub mod negotiator;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod walletconnect;

pub use domain::{
    chia_required_namespaces, ActionType, AppMetadata, Asset, ClientOptions, ConnectParams,
    ConnectProposal, GenerateOfferData, Namespace, Namespaces, Notice, NoticeLevel, OfferLeg,
    PairingSession, RpcRequest, SessionRecord, SessionRequest, SignedOffer, Token, CHIA_MAINNET,
    CHIA_NAMESPACE, METHOD_CREATE_OFFER_FOR_IDS, METHOD_SIGN_MESSAGE_BY_ADDRESS, NATIVE_ASSET_KEY,
};
pub use extension::ExtensionIntegration;
pub use integration::{
    InFlightGuard, IntegrationTimeouts, WaitStage, WalletError, WalletIntegration, WalletKind,
};
pub use modal::{ModalHandle, WeakModalHandle};
pub use negotiator::{build_offer_delta, create_offer_params, NegotiationError, OfferDeltaMap, OfferNegotiator};
pub use ports::{
    ConnectionPresenter, InjectedProviderPort, Notifier, PortError, SignClientFactory,
    SignClientPort,
};
pub use session::{active_pairing, canonical_session, SignerClient};
pub use state_machine::{
    connection_transition, replay, ConnectionAction, ConnectionState, StateError, StateTransition,
};
pub use walletconnect::{WalletConnectIntegration, WalletConnectOptions};
