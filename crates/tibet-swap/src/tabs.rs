//! Swap / liquidity tab selection and the offer-intent hand-off.

use tibet_signing_core::GenerateOfferData;

pub const SWAP_DISABLED_EMERGENCY: &str =
    "Swapping has been disabled - please withdraw your liquidity ASAP!";
pub const SWAP_DISABLED: &str = "Swapping is currently disabled - check back soon!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub swap_enabled: bool,
    pub emergency_withdraw: bool,
}

impl FeatureFlags {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Only the exact string `true` turns a flag on.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| lookup(key).is_some_and(|v| v.trim() == "true");
        Self {
            swap_enabled: flag("TIBET_SWAP_ENABLED"),
            emergency_withdraw: flag("TIBET_V1_EMERGENCY_WITHDRAW"),
        }
    }

    pub fn swap_allowed(&self) -> bool {
        !self.emergency_withdraw && self.swap_enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Swap,
    Liquidity,
}

/// Either a form tab is showing, or the generate-offer view for a confirmed intent.
#[derive(Debug, Clone)]
pub struct TabContainer {
    flags: FeatureFlags,
    active: Tab,
    pending_offer: Option<GenerateOfferData>,
}

impl TabContainer {
    pub fn new(flags: FeatureFlags) -> Self {
        let active = if flags.swap_allowed() {
            Tab::Swap
        } else {
            Tab::Liquidity
        };
        Self {
            flags,
            active,
            pending_offer: None,
        }
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    /// Switches tabs; a blocked switch leaves the tab unchanged and returns the reason to show.
    pub fn select(&mut self, tab: Tab) -> Result<(), &'static str> {
        if tab == Tab::Swap && !self.flags.swap_allowed() {
            return Err(if self.flags.emergency_withdraw {
                SWAP_DISABLED_EMERGENCY
            } else {
                SWAP_DISABLED
            });
        }
        self.active = tab;
        Ok(())
    }

    pub fn begin_offer(&mut self, data: GenerateOfferData) {
        tracing::info!(pair = %data.pair_id, action = ?data.action, "offer intent confirmed");
        self.pending_offer = Some(data);
    }

    pub fn pending_offer(&self) -> Option<&GenerateOfferData> {
        self.pending_offer.as_ref()
    }

    /// "Back" from the generate-offer view. The intent is dropped.
    pub fn back(&mut self) -> Option<GenerateOfferData> {
        self.pending_offer.take()
    }
}
