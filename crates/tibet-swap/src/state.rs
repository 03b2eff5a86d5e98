//! Application state types

use serde::{Deserialize, Serialize};

use tibet_signing_core::{SignedOffer, WalletError, WalletKind};

use crate::wallet_bridge::{take_result, ResultSlot};

/// eframe storage key for the wallet to reconnect eagerly on startup.
pub const LAST_WALLET_KEY: &str = "tibet_last_wallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastWallet {
    pub kind: WalletKind,
}

/// Wallet connection state as the UI sees it
#[derive(Default)]
pub struct WalletState {
    pub selected: Option<WalletKind>,
    pub connected: bool,
    pub connecting: Option<ResultSlot<bool>>,
    pub disconnecting: Option<ResultSlot<()>>,
}

impl WalletState {
    pub fn busy(&self) -> bool {
        self.connecting.is_some() || self.disconnecting.is_some()
    }

    /// Applies finished background results; returns `true` when anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        if let Some(done) = self.connecting.as_ref().and_then(take_result) {
            self.connecting = None;
            self.connected = done;
            if !done {
                self.selected = None;
            }
            changed = true;
        }
        if self
            .disconnecting
            .as_ref()
            .and_then(take_result)
            .is_some()
        {
            self.disconnecting = None;
            self.connected = false;
            self.selected = None;
            changed = true;
        }
        changed
    }
}

/// Generate-offer view state
#[derive(Default)]
pub struct OfferState {
    pub generating: Option<ResultSlot<Result<SignedOffer, WalletError>>>,
    pub result: Option<Result<SignedOffer, WalletError>>,
}

impl OfferState {
    pub fn poll(&mut self) {
        if let Some(done) = self.generating.as_ref().and_then(take_result) {
            self.generating = None;
            self.result = Some(done);
        }
    }

    pub fn reset(&mut self) {
        self.generating = None;
        self.result = None;
    }
}
