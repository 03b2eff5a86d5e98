//! Main application state and update loop

use std::time::Duration;

use eframe::egui;
use tibet_signing_core::{GenerateOfferData, Notice, NoticeLevel, WalletKind};

use crate::forms::{
    load_listings_from_env, LiquidityForm, PairListing, SwapDirection, SwapForm, CAT_DECIMALS,
    XCH_DECIMALS,
};
use crate::state::{LastWallet, OfferState, WalletState, LAST_WALLET_KEY};
use crate::tabs::{FeatureFlags, Tab, TabContainer};
use crate::ui;
use crate::wallet_bridge::WalletBridge;

const TOAST_SECONDS: f64 = 4.0;

/// The main application state
pub struct App {
    tabs: TabContainer,
    /// `None` until a token list is available; forms stay disabled meanwhile
    listings: Option<Vec<PairListing>>,
    swap_form: SwapForm,
    liquidity_form: LiquidityForm,
    form_error: Option<String>,
    bridge: WalletBridge,
    wallet: WalletState,
    offer: OfferState,
    toasts: Vec<(Notice, f64)>,
    alert: Option<&'static str>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>, bridge: WalletBridge) -> Self {
        let mut app = Self {
            tabs: TabContainer::new(FeatureFlags::from_env()),
            listings: load_listings_from_env(),
            swap_form: SwapForm::default(),
            liquidity_form: LiquidityForm::default(),
            form_error: None,
            bridge,
            wallet: WalletState::default(),
            offer: OfferState::default(),
            toasts: Vec::new(),
            alert: None,
        };

        let last: Option<LastWallet> = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, LAST_WALLET_KEY));
        if let Some(last) = last {
            tracing::info!(wallet = ?last.kind, "restoring previous wallet");
            let ctx = cc.egui_ctx.clone();
            app.wallet.selected = Some(last.kind);
            app.wallet.connecting =
                Some(app.bridge.eagerly_connect(last.kind, move || ctx.request_repaint()));
        }
        app
    }

    fn connect(&mut self, ctx: &egui::Context, kind: WalletKind) {
        let ctx = ctx.clone();
        self.wallet.selected = Some(kind);
        self.wallet.connecting = Some(self.bridge.connect(kind, move || ctx.request_repaint()));
    }

    fn disconnect(&mut self, ctx: &egui::Context) {
        if let Some(kind) = self.wallet.selected {
            let ctx = ctx.clone();
            self.wallet.disconnecting =
                Some(self.bridge.disconnect(kind, move || ctx.request_repaint()));
        }
    }

    fn generate_offer(&mut self, ctx: &egui::Context, data: &GenerateOfferData) {
        let Some(kind) = self.wallet.selected else {
            return;
        };
        let ctx = ctx.clone();
        self.offer.result = None;
        self.offer.generating = Some(self.bridge.generate_offer(kind, data, move || {
            ctx.request_repaint()
        }));
    }

    fn collect_toasts(&mut self, now: f64) {
        for notice in self.bridge.drain_toasts() {
            self.toasts.push((notice, now + TOAST_SECONDS));
        }
        self.toasts.retain(|(_, expires)| *expires > now);
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.wallet.poll();
        self.offer.poll();
        let now = ctx.input(|i| i.time);
        self.collect_toasts(now);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("TibetSwap")
                        .size(22.0)
                        .color(egui::Color32::from_rgb(0, 212, 170)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_wallet_controls(ui, ctx);
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Follow us on");
                if ui.link("Twitter").clicked() {
                    ui::open_url_new_tab("https://twitter.com/TibetSwap");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                match self.tabs.pending_offer().cloned() {
                    Some(data) => self.render_generate_offer(ui, ctx, &data),
                    None => self.render_tabs(ui),
                }
                ui.add_space(20.0);
            });
        });

        self.render_pairing_modals(ctx);
        self.render_alert(ctx);
        self.render_toasts(ctx);

        if self.wallet.busy() || self.offer.generating.is_some() || !self.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match (self.wallet.connected, self.wallet.selected) {
            (true, Some(kind)) => eframe::set_value(storage, LAST_WALLET_KEY, &LastWallet { kind }),
            _ => storage.set_string(LAST_WALLET_KEY, String::new()),
        }
    }
}

impl App {
    fn render_wallet_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.wallet.busy() {
            ui::loading_spinner(ui, "Waiting for wallet...");
            return;
        }
        if self.wallet.connected {
            if ui::secondary_button(ui, "Disconnect").clicked() {
                self.disconnect(ctx);
            }
            if let Some(kind) = self.wallet.selected {
                let wallet = self.bridge.integration(kind);
                ui.label(format!("Connected: {}", wallet.name()));
            }
            return;
        }
        for kind in [WalletKind::Extension, WalletKind::WalletConnect] {
            let name = self.bridge.integration(kind).name();
            if ui::secondary_button(ui, name).clicked() {
                self.connect(ctx, kind);
            }
        }
        ui.label("Connect wallet:");
    }

    fn render_tabs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let active = self.tabs.active();
            if ui.selectable_label(active == Tab::Swap, "Swap").clicked() {
                if let Err(reason) = self.tabs.select(Tab::Swap) {
                    self.alert = Some(reason);
                }
            }
            if ui
                .selectable_label(active == Tab::Liquidity, "Liquidity")
                .clicked()
            {
                let _ = self.tabs.select(Tab::Liquidity);
            }
        });
        ui.add_space(10.0);

        let Some(listings) = self.listings.clone() else {
            ui.label("Token list unavailable. Set TIBET_TOKEN_LIST to a pair listing file.");
            return;
        };
        let built = match self.tabs.active() {
            Tab::Swap => self.render_swap_form(ui, &listings),
            Tab::Liquidity => self.render_liquidity_form(ui, &listings),
        };
        match built {
            Some(Ok(data)) => {
                self.form_error = None;
                self.offer.reset();
                self.tabs.begin_offer(data);
            }
            Some(Err(e)) => self.form_error = Some(e),
            None => {}
        }
        if let Some(e) = &self.form_error {
            ui::error_message(ui, e);
        }
    }

    fn token_picker(ui: &mut egui::Ui, id: &str, selected: &mut usize, listings: &[PairListing]) {
        let label = listings
            .get(*selected)
            .map(|l| l.token.short_name.clone())
            .unwrap_or_default();
        egui::ComboBox::from_id_salt(id)
            .selected_text(label)
            .width(140.0)
            .show_ui(ui, |ui| {
                for (i, listing) in listings.iter().enumerate() {
                    ui.selectable_value(selected, i, &listing.token.short_name);
                }
            });
    }

    fn render_swap_form(
        &mut self,
        ui: &mut egui::Ui,
        listings: &[PairListing],
    ) -> Option<Result<GenerateOfferData, String>> {
        let form = &mut self.swap_form;
        let mut submitted = false;
        ui::card(ui, |ui| {
            ui::styled_heading(ui, "Swap");
            ui.horizontal(|ui| {
                ui.label("Token:");
                Self::token_picker(ui, "swap_token", &mut form.selected, listings);
                ui.selectable_value(&mut form.direction, SwapDirection::XchToToken, "Buy");
                ui.selectable_value(&mut form.direction, SwapDirection::TokenToXch, "Sell");
            });
            let (in_hint, out_hint) = match form.direction {
                SwapDirection::XchToToken => ("XCH", "token"),
                SwapDirection::TokenToXch => ("token", "XCH"),
            };
            ui.horizontal(|ui| {
                ui.label("You pay:");
                ui::number_input(ui, &mut form.amount_in, in_hint);
            });
            ui.horizontal(|ui| {
                ui.label("You receive:");
                ui::number_input(ui, &mut form.amount_out, out_hint);
            });
            ui.add_space(8.0);
            submitted = ui::primary_button_enabled(ui, "Generate Offer", true).clicked();
        });
        submitted.then(|| form.build(listings))
    }

    fn render_liquidity_form(
        &mut self,
        ui: &mut egui::Ui,
        listings: &[PairListing],
    ) -> Option<Result<GenerateOfferData, String>> {
        let form = &mut self.liquidity_form;
        let mut submitted = false;
        ui::card(ui, |ui| {
            ui::styled_heading(ui, "Liquidity");
            ui.horizontal(|ui| {
                ui.label("Token:");
                Self::token_picker(ui, "liquidity_token", &mut form.selected, listings);
                ui.selectable_value(&mut form.remove, false, "Add");
                ui.selectable_value(&mut form.remove, true, "Remove");
            });
            ui.horizontal(|ui| {
                ui.label("XCH:");
                ui::number_input(ui, &mut form.xch_amount, "XCH");
            });
            ui.horizontal(|ui| {
                ui.label("Token:");
                ui::number_input(ui, &mut form.token_amount, "token");
            });
            ui.horizontal(|ui| {
                ui.label("Liquidity:");
                ui::number_input(ui, &mut form.liquidity_amount, "liquidity token");
            });
            ui.add_space(8.0);
            submitted = ui::primary_button_enabled(ui, "Generate Offer", true).clicked();
        });
        submitted.then(|| form.build(listings))
    }

    fn render_generate_offer(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        data: &GenerateOfferData,
    ) {
        if ui.link("‹ Back").clicked() {
            self.tabs.back();
            self.offer.reset();
            return;
        }
        ui.add_space(10.0);
        ui::styled_heading(ui, "Generate Offer");

        ui::card(ui, |ui| {
            ui::section_header(ui, "You offer");
            legs(ui, &data.offer);
            ui::section_header(ui, "You receive");
            legs(ui, &data.request);
        });
        ui.add_space(10.0);

        if !self.wallet.connected {
            ui.label("Connect a wallet to create this offer.");
            return;
        }

        let generating = self.offer.generating.is_some();
        if ui::primary_button_enabled(ui, "Create offer in wallet", !generating).clicked() {
            self.generate_offer(ctx, data);
        }
        if generating {
            ui::loading_spinner(ui, "Confirm the offer in your wallet...");
        }
        match &self.offer.result {
            Some(Ok(offer)) => {
                ui::success_message(ui, "Offer generated");
                if let Some(text) = offer.offer_text() {
                    ui::copyable_text(ui, text);
                }
            }
            Some(Err(e)) => ui::error_message(ui, &e.to_string()),
            None => {}
        }
    }

    fn render_pairing_modals(&mut self, ctx: &egui::Context) {
        for modal in self.bridge.open_modals() {
            let mut open = true;
            egui::Window::new("Scan with your Chia wallet")
                .id(egui::Id::new(("pairing_modal", modal.id)))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .open(&mut open)
                .show(ctx, |ui| {
                    ui::qr_code(ui, &modal.qr, 300.0);
                    ui.add_space(6.0);
                    ui::copyable_text(ui, &modal.payload);
                });
            if !open {
                modal.cancel();
            }
        }
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert else {
            return;
        };
        let mut open = true;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(message);
            });
        if !open {
            self.alert = None;
        }
    }

    fn render_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -36.0))
            .show(ctx, |ui| {
                for (notice, _) in &self.toasts {
                    ui::card(ui, |ui| match notice.level {
                        NoticeLevel::Error => ui::error_message(ui, &notice.message),
                        NoticeLevel::Success => ui::success_message(ui, &notice.message),
                        NoticeLevel::Info => {
                            ui.label(&notice.message);
                        }
                    });
                    ui.add_space(4.0);
                }
            });
    }
}

fn legs(ui: &mut egui::Ui, legs: &[tibet_signing_core::OfferLeg]) {
    for leg in legs {
        let decimals = if leg.is_native {
            XCH_DECIMALS
        } else {
            CAT_DECIMALS
        };
        ui.horizontal(|ui| {
            ui.label(ui::format_amount(leg.amount, decimals));
            let link = ui.link(&leg.token.short_name);
            if link.clicked() {
                ui::open_url_new_tab(&ui::spacescan_asset_url(&leg.token.asset_id));
            }
        });
    }
}
