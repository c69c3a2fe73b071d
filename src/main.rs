mod api;
mod app;
mod config;
mod pdf;
mod poller;
mod registry;
mod uploader;
mod utils;
mod worker;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::DashboardApp;
use crate::config::Config;
use crate::worker::WorkerHandle;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(
            EnvFilter::from_default_env().add_directive("pdf_dashboard=info".parse()?),
        )
        .init();

    let config = Config::load();
    tracing::info!(base_url = %config.base_url, "starting dashboard");

    let worker = WorkerHandle::spawn(config.clone())?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Management Dashboard",
        options,
        Box::new(move |cc| Box::new(DashboardApp::new(cc, config, worker))),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch ui: {err}"))
}
