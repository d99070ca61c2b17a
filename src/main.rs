mod app;
mod backend;
mod chat;
mod config;
mod error;
mod event;
mod form;
mod session;
mod theme;

use app::DocPilotApp;
use backend::BackendClient;
use config::AppConfig;
use eframe::egui;
use session::store::SessionStore;
use std::sync::mpsc;
use tracing::{info, warn};

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = AppConfig::load();
    init_tracing(&config.log_level);
    if let Some(err) = config_error {
        warn!("{err}; using default configuration");
    }
    info!(backend = %config.backend_url, output = %config.output_dir.display(), "starting docpilot");

    let (tx, rx) = mpsc::channel();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("docpilot-runtime")
        .build()?;

    let backend = BackendClient::new(&config, runtime.handle().clone(), tx)?;
    let app = DocPilotApp::new(rx, backend, config, SessionStore::default_location());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1360.0, 820.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DocPilot",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
