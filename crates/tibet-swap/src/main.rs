//! TibetSwap: a Rust-native client that negotiates Chia offers with an external wallet

use eframe::egui;
use eyre::WrapErr;

use tibet_signing_adapters::WalletAdapterConfig;

mod app;
mod forms;
mod state;
mod tabs;
mod ui;
mod wallet_bridge;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!(
        git = env!("GIT_HASH"),
        built = env!("BUILD_TIME"),
        "Starting TibetSwap"
    );

    let config = WalletAdapterConfig::from_env();
    let bridge =
        wallet_bridge::WalletBridge::new(&config).wrap_err("failed to start wallet runtime")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TibetSwap")
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TibetSwap",
        native_options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc, bridge)))),
    )
    .map_err(|e| eyre::eyre!("eframe exited with error: {e}"))
}
