//! Swap and liquidity form models. Each form turns user input into a [`GenerateOfferData`].

use serde::{Deserialize, Serialize};

use tibet_signing_core::{ActionType, GenerateOfferData, OfferLeg, Token};

/// 1 XCH = 10^12 mojos.
pub const XCH_DECIMALS: u32 = 12;
/// CATs and liquidity tokens use 3 decimals.
pub const CAT_DECIMALS: u32 = 3;

/// A tradable pair as listed by the token list: the CAT plus its liquidity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairListing {
    pub token: Token,
    pub liquidity_asset_id: String,
}

impl PairListing {
    pub fn liquidity_token(&self) -> Token {
        Token {
            asset_id: self.liquidity_asset_id.clone(),
            pair_id: self.token.pair_id.clone(),
            name: format!("{} Liquidity", self.token.name),
            short_name: format!("TIBET-{}-XCH", self.token.short_name),
            image_url: self.token.image_url.clone(),
            verified: self.token.verified,
        }
    }
}

pub fn xch_token() -> Token {
    Token {
        asset_id: String::new(),
        pair_id: String::new(),
        name: "Chia".to_owned(),
        short_name: "XCH".to_owned(),
        image_url: "/assets/xch.webp".to_owned(),
        verified: true,
    }
}

/// Loads listings from the JSON file named by `TIBET_TOKEN_LIST`; `None` disables the forms.
pub fn load_listings_from_env() -> Option<Vec<PairListing>> {
    let path = std::env::var("TIBET_TOKEN_LIST").ok()?;
    match std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
    {
        Ok(listings) => Some(listings),
        Err(e) => {
            tracing::warn!(%path, error = %e, "token list unavailable");
            None
        }
    }
}

/// Parses a decimal amount into atomic units. Rejects zero, negatives and excess precision.
pub fn parse_amount(input: &str, decimals: u32) -> Option<u64> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) || frac.len() > decimals as usize {
        return None;
    }
    let scale = 10u64.checked_pow(decimals)?;
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_padded = format!("{frac:0<width$}", width = decimals as usize);
    let frac: u64 = if frac_padded.is_empty() {
        0
    } else {
        frac_padded.parse().ok()?
    };
    let amount = whole.checked_mul(scale)?.checked_add(frac)?;
    (amount > 0).then_some(amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapDirection {
    #[default]
    XchToToken,
    TokenToXch,
}

#[derive(Debug, Clone, Default)]
pub struct SwapForm {
    pub selected: usize,
    pub direction: SwapDirection,
    pub amount_in: String,
    pub amount_out: String,
}

impl SwapForm {
    pub fn build(&self, listings: &[PairListing]) -> Result<GenerateOfferData, String> {
        let listing = listings.get(self.selected).ok_or("Select a token first")?;
        let (in_decimals, out_decimals) = match self.direction {
            SwapDirection::XchToToken => (XCH_DECIMALS, CAT_DECIMALS),
            SwapDirection::TokenToXch => (CAT_DECIMALS, XCH_DECIMALS),
        };
        let amount_in = parse_amount(&self.amount_in, in_decimals).ok_or("Invalid input amount")?;
        let amount_out =
            parse_amount(&self.amount_out, out_decimals).ok_or("Invalid output amount")?;

        let xch = |amount| OfferLeg {
            token: xch_token(),
            is_native: true,
            amount,
        };
        let cat = |amount| OfferLeg {
            token: listing.token.clone(),
            is_native: false,
            amount,
        };
        let (offer, request) = match self.direction {
            SwapDirection::XchToToken => (xch(amount_in), cat(amount_out)),
            SwapDirection::TokenToXch => (cat(amount_in), xch(amount_out)),
        };
        Ok(GenerateOfferData {
            pair_id: listing.token.pair_id.clone(),
            offer: vec![offer],
            request: vec![request],
            action: ActionType::Swap,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiquidityForm {
    pub selected: usize,
    pub remove: bool,
    pub xch_amount: String,
    pub token_amount: String,
    pub liquidity_amount: String,
}

impl LiquidityForm {
    pub fn build(&self, listings: &[PairListing]) -> Result<GenerateOfferData, String> {
        let listing = listings.get(self.selected).ok_or("Select a token first")?;
        let xch = OfferLeg {
            token: xch_token(),
            is_native: true,
            amount: parse_amount(&self.xch_amount, XCH_DECIMALS).ok_or("Invalid XCH amount")?,
        };
        let token = OfferLeg {
            token: listing.token.clone(),
            is_native: false,
            amount: parse_amount(&self.token_amount, CAT_DECIMALS)
                .ok_or("Invalid token amount")?,
        };
        let liquidity = OfferLeg {
            token: listing.liquidity_token(),
            is_native: false,
            amount: parse_amount(&self.liquidity_amount, CAT_DECIMALS)
                .ok_or("Invalid liquidity amount")?,
        };

        let (offer, request, action) = if self.remove {
            (vec![liquidity], vec![xch, token], ActionType::RemoveLiquidity)
        } else {
            (vec![xch, token], vec![liquidity], ActionType::AddLiquidity)
        };
        Ok(GenerateOfferData {
            pair_id: listing.token.pair_id.clone(),
            offer,
            request,
            action,
        })
    }
}
