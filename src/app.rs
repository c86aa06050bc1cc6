use std::sync::Arc;

use eframe::egui;

use crate::export;
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// A file dropped on the window starts an analysis like File → Open.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            panels::start_analysis(ctx, &mut self.state, path);
        }
    }

    /// Finish a pending export once the requested screenshot arrives.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        let shot = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let Some(image) = shot else {
            return;
        };
        let Some(path) = self.state.pending_export.clone() else {
            return;
        };

        let result = match self.state.dashboard_rect {
            Some(rect) => {
                let snapshot = export::crop_to_region(&image, rect, ctx.pixels_per_point());
                export::write_snapshot(&snapshot, &path)
                    .map(|()| path)
                    .map_err(|e| e.to_string())
            }
            None => Err("the dashboard is not visible".to_string()),
        };
        self.state.finish_export(result);
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.state.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        self.state.poll_analysis();
        self.handle_screenshot(ctx);
        if !self.state.is_loading() {
            self.handle_dropped_files(ctx);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if self.state.dashboard.is_some() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: dashboard or upload screen ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dashboard.is_some() {
                charts::dashboard(ui, &mut self.state);
            } else {
                panels::upload_screen(ui, &mut self.state);
            }
        });

        panels::notice_modal(ctx, &mut self.state);
    }
}
