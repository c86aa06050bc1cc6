use std::path::PathBuf;

use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::classify::{ColumnDescriptor, ColumnKind};
use crate::data::filter::FilterConstraint;
use crate::data::model::{cell, Dataset};
use crate::state::{AppState, LoadingKind};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    if state.filters.is_empty() {
        ui.heading("Filters");
    } else {
        ui.heading(format!("Filters ({} active)", state.filters.len()));
    }
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    if state.descriptors.is_empty() {
        ui.label("No filterable columns.");
        return;
    }

    ui.label(format!(
        "{} of {} rows",
        state.filtered_rows.len(),
        dataset.len()
    ));

    // Collect edits first, apply after the widgets have released `state`.
    let mut changes: Vec<(String, FilterConstraint)> = Vec::new();
    let mut clear_all = false;

    ui.add_enabled_ui(!state.is_loading(), |ui: &mut Ui| {
        if ui
            .add_enabled(!state.filters.is_empty(), egui::Button::new("Clear all"))
            .clicked()
        {
            clear_all = true;
        }
        ui.separator();

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                for desc in &state.descriptors {
                    let current = state.filters.get(&desc.name);
                    let change = match &desc.kind {
                        ColumnKind::Categorical { .. } => {
                            category_filter(ui, &desc.name, desc.options(), current)
                        }
                        ColumnKind::DateRange => date_range_filter(ui, desc, dataset, current),
                    };
                    if let Some(c) = change {
                        changes.push((desc.name.clone(), c));
                    }
                    ui.add_space(6.0);
                }
            });
    });

    if clear_all {
        state.clear_filters();
    }
    for (column, constraint) in changes {
        state.set_filter(&column, constraint);
    }
}

/// Combo box with an "All" entry that clears the constraint.
fn category_filter(
    ui: &mut Ui,
    column: &str,
    options: &[String],
    current: Option<&FilterConstraint>,
) -> Option<FilterConstraint> {
    let selected = match current {
        Some(FilterConstraint::Category(v)) => v.as_str(),
        _ => "",
    };
    let mut change = None;

    ui.strong(column);
    egui::ComboBox::from_id_salt(("category", column))
        .selected_text(if selected.is_empty() { "All" } else { selected })
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(selected.is_empty(), "All").clicked() {
                change = Some(FilterConstraint::Category(String::new()));
            }
            for opt in options {
                if ui.selectable_label(selected == opt.as_str(), opt).clicked() {
                    change = Some(FilterConstraint::Category(opt.clone()));
                }
            }
        });
    change
}

/// Optional start / end pickers. Unchecking a bound makes it unbounded.
fn date_range_filter(
    ui: &mut Ui,
    desc: &ColumnDescriptor,
    dataset: &Dataset,
    current: Option<&FilterConstraint>,
) -> Option<FilterConstraint> {
    let (start, end) = match current {
        Some(FilterConstraint::DateRange { start, end }) => (*start, *end),
        _ => (None, None),
    };
    let mut new_start = start;
    let mut new_end = end;

    ui.strong(&desc.name);
    ui.horizontal(|ui: &mut Ui| {
        date_bound(ui, "From", (desc.name.as_str(), "start"), &mut new_start, || {
            column_date_bounds(dataset, &desc.name).0
        });
    });
    ui.horizontal(|ui: &mut Ui| {
        date_bound(ui, "To", (desc.name.as_str(), "end"), &mut new_end, || {
            column_date_bounds(dataset, &desc.name).1
        });
    });

    (new_start != start || new_end != end).then_some(FilterConstraint::DateRange {
        start: new_start,
        end: new_end,
    })
}

fn date_bound(
    ui: &mut Ui,
    label: &str,
    id: (&str, &str),
    bound: &mut Option<NaiveDate>,
    default: impl FnOnce() -> Option<NaiveDate>,
) {
    let mut enabled = bound.is_some();
    if ui.checkbox(&mut enabled, label).changed() {
        *bound = if enabled {
            Some(default().unwrap_or_else(|| chrono::Local::now().date_naive()))
        } else {
            None
        };
    }
    if let Some(date) = bound {
        ui.add(DatePickerButton::new(date).id_salt(&format!("{}_{}", id.0, id.1)));
    }
}

/// Earliest and latest parseable dates in a column.
fn column_date_bounds(dataset: &Dataset, column: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    dataset
        .rows
        .iter()
        .filter_map(|row| cell(row, column).as_datetime().map(|dt| dt.date()))
        .fold((None, None), |(lo, hi), d| {
            (
                Some(lo.map_or(d, |l: NaiveDate| l.min(d))),
                Some(hi.map_or(d, |h: NaiveDate| h.max(d))),
            )
        })
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    let busy = state.is_loading();

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.add_enabled(!busy, egui::Button::new("Open…")).clicked() {
                open_file_dialog(ui.ctx(), state);
                ui.close_menu();
            }
            let can_export = !busy && state.dashboard.is_some();
            if ui.add_enabled(can_export, egui::Button::new("Export…")).clicked() {
                export_dialog(ui.ctx(), state);
                ui.close_menu();
            }
            let can_close = !busy && state.dataset.is_some();
            if ui.add_enabled(can_close, egui::Button::new("Close")).clicked() {
                state.reset();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{}: {} rows loaded, {} visible",
                ds.file_name,
                ds.len(),
                state.filtered_rows.len()
            ));
            ui.separator();
        }

        let theme_label = if state.settings.dark_mode { "☀ Light" } else { "🌙 Dark" };
        if ui.selectable_label(false, theme_label).clicked() {
            state.toggle_dark_mode();
        }

        if let Some(kind) = state.loading {
            ui.separator();
            ui.add(egui::Spinner::new());
            ui.label(match kind {
                LoadingKind::Analyzing => "Analyzing…",
                LoadingKind::Exporting => "Exporting…",
            });
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Upload screen
// ---------------------------------------------------------------------------

/// Shown while no dashboard is loaded.
pub fn upload_screen(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        if state.loading == Some(LoadingKind::Analyzing) {
            ui.add(egui::Spinner::new().size(32.0));
            ui.heading("Analyzing your data…");
            ui.label("Parsing the file and asking the model for a dashboard layout.");
            return;
        }
        ui.heading("Open a spreadsheet to build a dashboard");
        ui.label("CSV, XLS or XLSX. Drop a file here or choose one.");
        ui.add_space(8.0);
        if ui.button("Choose file…").clicked() {
            open_file_dialog(ui.ctx(), state);
        }
    });
}

// ---------------------------------------------------------------------------
// Blocking notice
// ---------------------------------------------------------------------------

pub fn notice_modal(ctx: &egui::Context, state: &mut AppState) {
    let Some(msg) = state.notice.clone() else {
        return;
    };
    let mut dismissed = false;
    let modal = egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui: &mut Ui| {
        ui.set_width(320.0);
        ui.heading("Something went wrong");
        ui.label(msg);
        ui.add_space(8.0);
        if ui.button("OK").clicked() {
            dismissed = true;
        }
    });
    if dismissed || modal.should_close() {
        state.notice = None;
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(ctx: &egui::Context, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spreadsheet")
        .add_filter("Spreadsheets", &["csv", "xls", "xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xls", "xlsx"])
        .pick_file();

    if let Some(path) = file {
        start_analysis(ctx, state, path);
    }
}

/// Kick off analysis and wake the UI when the worker is done.
pub fn start_analysis(ctx: &egui::Context, state: &mut AppState, path: PathBuf) {
    let ctx = ctx.clone();
    state.begin_analysis(path, move || ctx.request_repaint());
}

pub fn export_dialog(ctx: &egui::Context, state: &mut AppState) {
    let stem = state
        .dataset
        .as_ref()
        .and_then(|ds| ds.file_name.rsplit_once('.').map(|(s, _)| s.to_string()))
        .unwrap_or_else(|| "dashboard".to_string());

    let file = rfd::FileDialog::new()
        .set_title("Export dashboard")
        .set_file_name(format!("{stem}-dashboard.pdf"))
        .add_filter("PDF", &["pdf"])
        .add_filter("PNG", &["png"])
        .save_file();

    if let Some(path) = file {
        if state.begin_export(path) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
        }
    }
}
