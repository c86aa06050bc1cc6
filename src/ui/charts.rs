use std::f64::consts::TAU;
use std::sync::Arc;

use eframe::egui::{self, Frame, RichText, ScrollArea, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points, Polygon};

use crate::ai::{ChartKind, ChartSpec};
use crate::color::{generate_palette, series_color};
use crate::data::model::{cell, SharedRow};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the generated dashboard: title, summary and a two-column chart grid.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let Some(config) = state.dashboard.clone() else {
        return;
    };
    let rows = Arc::clone(&state.filtered_rows);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let inner = ui.vertical(|ui: &mut Ui| {
                ui.heading(&config.title);
                if !config.summary.is_empty() {
                    ui.label(&config.summary);
                }
                ui.add_space(8.0);

                if rows.is_empty() {
                    ui.label(RichText::new("No rows match the current filters.").italics());
                }

                for pair in config.charts.chunks(2) {
                    ui.columns(2, |cols: &mut [Ui]| {
                        for (col, spec) in cols.iter_mut().zip(pair) {
                            chart_card(col, spec, &rows);
                        }
                    });
                    ui.add_space(8.0);
                }
            });
            state.dashboard_rect = Some(inner.response.rect.intersect(ui.clip_rect()));
        });
}

fn chart_card(ui: &mut Ui, spec: &ChartSpec, rows: &[SharedRow]) {
    Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.strong(&spec.title);
        if !spec.description.is_empty() {
            ui.label(RichText::new(&spec.description).weak());
        }
        chart_plot(ui, spec, rows);
    });
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

/// One chart from the filtered rows. Each row is one point / bar / slice;
/// nothing is aggregated.
pub fn chart_plot(ui: &mut Ui, spec: &ChartSpec, rows: &[SharedRow]) {
    let plot = Plot::new(("chart", spec.id.as_str()))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false);

    match spec.kind {
        ChartKind::Pie => pie_chart(ui, plot, spec, rows),
        ChartKind::Scatter => {
            plot.show(ui, |plot_ui| {
                for (s, key) in spec.y_keys.iter().enumerate() {
                    let points: Vec<[f64; 2]> = rows
                        .iter()
                        .enumerate()
                        .filter_map(|(i, row)| {
                            let x = cell(row, &spec.x_key).as_f64().unwrap_or(i as f64);
                            Some([x, cell(row, key).as_f64()?])
                        })
                        .collect();
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .name(key)
                            .color(series_color(s))
                            .radius(3.0),
                    );
                }
            });
        }
        ChartKind::Bar | ChartKind::Line | ChartKind::Area => {
            let labels = x_labels(rows, &spec.x_key);
            let plot = plot.x_axis_formatter(move |mark, _range| {
                let i = mark.value;
                if i.fract() != 0.0 || i < 0.0 {
                    return String::new();
                }
                labels.get(i as usize).cloned().unwrap_or_default()
            });
            plot.show(ui, |plot_ui| {
                let n_series = spec.y_keys.len().max(1) as f64;
                for (s, key) in spec.y_keys.iter().enumerate() {
                    let color = series_color(s);
                    if spec.kind == ChartKind::Bar {
                        let width = 0.8 / n_series;
                        let offset = (s as f64 - (n_series - 1.0) / 2.0) * width;
                        let bars: Vec<Bar> = rows
                            .iter()
                            .enumerate()
                            .filter_map(|(i, row)| {
                                let y = cell(row, key).as_f64()?;
                                Some(Bar::new(i as f64 + offset, y).width(width))
                            })
                            .collect();
                        plot_ui.bar_chart(BarChart::new(bars).name(key).color(color));
                    } else {
                        let points: Vec<[f64; 2]> = rows
                            .iter()
                            .enumerate()
                            .filter_map(|(i, row)| Some([i as f64, cell(row, key).as_f64()?]))
                            .collect();
                        let mut line = Line::new(PlotPoints::from(points))
                            .name(key)
                            .color(color)
                            .width(1.5);
                        if spec.kind == ChartKind::Area {
                            line = line.fill(0.0);
                        }
                        plot_ui.line(line);
                    }
                }
            });
        }
    }
}

fn x_labels(rows: &[SharedRow], x_key: &str) -> Vec<String> {
    rows.iter().map(|row| cell(row, x_key).to_string()).collect()
}

/// Slices sized by the first y key, labelled by the x key. Non-positive
/// values are skipped.
fn pie_chart(ui: &mut Ui, plot: Plot, spec: &ChartSpec, rows: &[SharedRow]) {
    let Some(value_key) = spec.y_keys.first() else {
        return;
    };
    let slices: Vec<(String, f64)> = rows
        .iter()
        .filter_map(|row| {
            let v = cell(row, value_key).as_f64().filter(|v| *v > 0.0)?;
            Some((cell(row, &spec.x_key).to_string(), v))
        })
        .collect();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    let palette = generate_palette(slices.len());

    plot.data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .show_x(false)
        .show_y(false)
        .show(ui, |plot_ui| {
            if total <= 0.0 {
                return;
            }
            let mut start = 0.0;
            for ((label, value), color) in slices.iter().zip(palette) {
                let sweep = value / total * TAU;
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(slice_points(start, sweep)))
                        .name(label)
                        .fill_color(color)
                        .stroke(Stroke::new(1.0, egui::Color32::WHITE)),
                );
                start += sweep;
            }
        });
}

/// Outline of a unit-circle sector starting at 12 o'clock, clockwise.
fn slice_points(start: f64, sweep: f64) -> Vec<[f64; 2]> {
    let steps = ((sweep / TAU) * 64.0).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push([0.0, 0.0]);
    for k in 0..=steps {
        let angle = start + sweep * k as f64 / steps as f64;
        points.push([angle.sin(), angle.cos()]);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Row};

    #[test]
    fn sector_outline_starts_at_centre_and_spans_sweep() {
        let pts = slice_points(0.0, TAU / 4.0);
        assert_eq!(pts[0], [0.0, 0.0]);
        let first = pts[1];
        let last = *pts.last().unwrap();
        assert!((first[0] - 0.0).abs() < 1e-9 && (first[1] - 1.0).abs() < 1e-9);
        assert!((last[0] - 1.0).abs() < 1e-9 && last[1].abs() < 1e-9);
    }

    #[test]
    fn x_labels_use_coerced_cell_text() {
        let mut a = Row::new();
        a.insert("Year".into(), CellValue::Number(2021.0));
        let b = Row::new();
        assert_eq!(x_labels(&[Arc::new(a), Arc::new(b)], "Year"), ["2021", ""]);
    }
}
