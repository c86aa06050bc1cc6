mod ai;
mod app;
mod color;
mod config;
mod data;
mod export;
mod pipeline;
mod state;
mod ui;

use std::sync::Arc;

use anyhow::Context;
use app::DashboardApp;
use eframe::egui;

use crate::ai::GeminiClient;
use crate::config::Settings;
use crate::state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::load();
    let generator = GeminiClient::new(&settings.ai).context("building AI client")?;
    let state = AppState::new(settings, Arc::new(generator));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Dashboard – AI Spreadsheet Dashboards",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
