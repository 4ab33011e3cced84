mod api;
mod app;
mod config;
mod error;
mod server;
mod store;
mod tray;

use std::sync::Arc;

use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let config = config::Config::default();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_target(false)
        .compact()
        .init();
    tracing::info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let store = Arc::new(store::ItemStore::new());
    let controller = Arc::new(server::ServerController::new(config.clone(), store));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "Item Tray",
        options,
        Box::new(move |_cc| Ok(Box::new(app::ItemTrayApp::new(controller)))),
    )
}
