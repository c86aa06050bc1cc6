use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::Rect;

use crate::ai::{DashboardConfig, DashboardGenerator};
use crate::config::Settings;
use crate::data::classify::{classify_columns, ColumnDescriptor};
use crate::data::filter::{apply_filters, ActiveFilters, FilterConstraint};
use crate::data::loader::FileKind;
use crate::data::model::{Dataset, SharedRow};
use crate::pipeline::{AnalysisOutcome, AnalysisTask};

/// Which long-running operation is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingKind {
    Analyzing,
    Exporting,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Injected at startup; written back when the theme is toggled.
    pub settings: Settings,

    /// Loaded dataset (None until a file has been analyzed).
    pub dataset: Option<Dataset>,

    /// Generated dashboard layout for `dataset`.
    pub dashboard: Option<DashboardConfig>,

    /// Filterable columns of `dataset`.
    pub descriptors: Vec<ColumnDescriptor>,

    /// Per-column filter selections.
    pub filters: ActiveFilters,

    /// Rows passing the current filters (cached, shared with `dataset` when
    /// nothing is filtered).
    pub filtered_rows: Arc<Vec<SharedRow>>,

    /// Outstanding long-running operation, if any.
    pub loading: Option<LoadingKind>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    /// Blocking notification shown in a modal until dismissed.
    pub notice: Option<String>,

    /// Screen area of the chart grid, for export cropping.
    pub dashboard_rect: Option<Rect>,

    /// Destination of a requested export, awaiting its screenshot.
    pub pending_export: Option<PathBuf>,

    generator: Arc<dyn DashboardGenerator>,
    analysis: Option<AnalysisTask>,
}

impl AppState {
    pub fn new(settings: Settings, generator: Arc<dyn DashboardGenerator>) -> Self {
        Self {
            settings,
            dataset: None,
            dashboard: None,
            descriptors: Vec::new(),
            filters: ActiveFilters::default(),
            filtered_rows: Arc::new(Vec::new()),
            loading: None,
            status_message: None,
            notice: None,
            dashboard_rect: None,
            pending_export: None,
            generator,
            analysis: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    // -- analysis --------------------------------------------------------

    /// Validate the file and start parse → generate in the background.
    ///
    /// Unsupported files only set a status message. Returns whether a task
    /// was started.
    pub fn begin_analysis(
        &mut self,
        path: PathBuf,
        on_done: impl FnOnce() + Send + 'static,
    ) -> bool {
        if self.is_loading() {
            log::warn!("Ignoring {} while another operation is running", path.display());
            return false;
        }
        if let Err(e) = FileKind::detect(&path) {
            self.status_message = Some(e.to_string());
            return false;
        }

        log::info!("Analyzing {}", path.display());
        self.analysis = Some(AnalysisTask::spawn(
            path,
            Arc::clone(&self.generator),
            on_done,
        ));
        self.loading = Some(LoadingKind::Analyzing);
        self.status_message = None;
        true
    }

    /// Pick up a finished analysis, if any. Called once per frame.
    pub fn poll_analysis(&mut self) {
        let Some(task) = &self.analysis else {
            return;
        };
        let Some(outcome) = task.poll() else {
            return;
        };
        self.analysis = None;
        self.loading = None;

        match outcome {
            AnalysisOutcome::Ready { dataset, config } => self.set_dashboard(dataset, config),
            AnalysisOutcome::Failed(e) => {
                log::error!("Analysis failed: {e:#}");
                self.reset();
                self.notice = Some(e.user_message());
            }
        }
    }

    // -- orchestration ---------------------------------------------------

    /// Ingest a new dataset and its layout: reclassify, drop all filters,
    /// show every row.
    pub fn set_dashboard(&mut self, dataset: Dataset, config: DashboardConfig) {
        self.descriptors = classify_columns(&dataset);
        self.filters = ActiveFilters::default();
        self.filtered_rows = Arc::clone(&dataset.rows);
        log::info!(
            "Loaded {} rows with {} filterable columns",
            dataset.len(),
            self.descriptors.len()
        );
        self.dataset = Some(dataset);
        self.dashboard = Some(config);
        self.status_message = None;
    }

    /// Set or clear one column's constraint and republish the filtered rows.
    pub fn set_filter(&mut self, column: &str, constraint: FilterConstraint) {
        self.filters.set(column, constraint);
        self.refilter();
    }

    /// Drop every constraint.
    pub fn clear_filters(&mut self) {
        self.filters = ActiveFilters::default();
        self.refilter();
    }

    /// Recompute `filtered_rows` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filtered_rows = apply_filters(&ds.rows, &self.filters);
        }
    }

    /// Back to the upload screen.
    pub fn reset(&mut self) {
        self.dataset = None;
        self.dashboard = None;
        self.descriptors.clear();
        self.filters = ActiveFilters::default();
        self.filtered_rows = Arc::new(Vec::new());
        self.dashboard_rect = None;
    }

    // -- export ----------------------------------------------------------

    /// Remember where to write the snapshot; the caller requests the
    /// screenshot. Returns false when nothing can be exported right now.
    pub fn begin_export(&mut self, path: PathBuf) -> bool {
        if self.is_loading() || self.dashboard.is_none() {
            return false;
        }
        self.pending_export = Some(path);
        self.loading = Some(LoadingKind::Exporting);
        true
    }

    /// Report an export's result. Always clears the loading state.
    pub fn finish_export(&mut self, result: Result<PathBuf, String>) {
        self.pending_export = None;
        self.loading = None;
        match result {
            Ok(path) => {
                self.status_message = Some(format!("Exported to {}", path.display()));
            }
            Err(msg) => {
                log::error!("Export failed: {msg}");
                self.notice = Some(format!("Failed to export the dashboard: {msg}"));
            }
        }
    }

    // -- settings --------------------------------------------------------

    pub fn toggle_dark_mode(&mut self) {
        if let Err(e) = self.settings.toggle_dark_mode() {
            log::warn!("Could not save settings: {e:#}");
            self.status_message = Some(format!("Settings not saved: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::classify::ColumnKind;
    use crate::data::model::{CellValue, Row};
    use crate::pipeline::tests::{csv_file, sample_config, MockGenerator};
    use crate::pipeline::ANALYSIS_FAILED_MESSAGE;
    use std::time::{Duration, Instant};

    fn state(generator: MockGenerator) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        (AppState::new(settings, Arc::new(generator)), dir)
    }

    fn dataset() -> Dataset {
        let regions = ["North", "South", "East", "North", "South", "East", "North", "West", "West", "East"];
        let rows: Vec<Row> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut row = Row::new();
                row.insert("Region".into(), CellValue::String(r.to_string()));
                row.insert("Revenue".into(), CellValue::Number((i * 10) as f64));
                row
            })
            .collect();
        Dataset::new("sales.csv", vec!["Region".into(), "Revenue".into()], rows)
    }

    fn settle(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_loading() {
            assert!(Instant::now() < deadline, "analysis did not finish");
            state.poll_analysis();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn new_dataset_resets_filters_and_shows_everything() {
        let (mut state, _dir) = state(MockGenerator::ok());
        state.set_dashboard(dataset(), sample_config());
        state.set_filter("Region", FilterConstraint::Category("North".into()));
        assert_eq!(state.filtered_rows.len(), 3);

        state.set_dashboard(dataset(), sample_config());
        assert!(state.filters.is_empty());
        let ds = state.dataset.as_ref().unwrap();
        assert!(Arc::ptr_eq(&state.filtered_rows, &ds.rows));
        assert_eq!(state.descriptors[0].name, "Region");
    }

    #[test]
    fn selecting_all_after_a_category_restores_the_full_set() {
        let (mut state, _dir) = state(MockGenerator::ok());
        state.set_dashboard(dataset(), sample_config());
        state.set_filter("Region", FilterConstraint::Category("West".into()));
        assert_eq!(state.filtered_rows.len(), 2);

        state.set_filter("Region", FilterConstraint::Category(String::new()));
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(*state.filtered_rows, *ds.rows);
        assert!(state.filters.is_empty());
    }

    #[test]
    fn descriptors_come_from_the_loaded_dataset() {
        let (mut state, _dir) = state(MockGenerator::ok());
        state.set_dashboard(dataset(), sample_config());
        match &state.descriptors[0].kind {
            ColumnKind::Categorical { options } => {
                assert_eq!(options, &["East", "North", "South", "West"])
            }
            other => panic!("unexpected kind {other:?}"),
        }
        // Ten distinct revenues still qualify as categories.
        assert_eq!(state.descriptors.len(), 2);
    }

    #[test]
    fn unsupported_file_changes_nothing() {
        let (mut state, _dir) = state(MockGenerator::ok());
        state.set_dashboard(dataset(), sample_config());
        let started = state.begin_analysis(PathBuf::from("notes.txt"), || {});
        assert!(!started);
        assert!(!state.is_loading());
        assert!(state.dataset.is_some());
        assert!(state.status_message.as_deref().unwrap().contains("Unsupported"));
    }

    #[test]
    fn successful_analysis_publishes_the_dashboard() {
        let (mut state, _dir) = state(MockGenerator::ok());
        let file = csv_file("Region,Revenue\nNorth,10\nSouth,20\n");
        assert!(state.begin_analysis(file.path().to_path_buf(), || {}));
        assert_eq!(state.loading, Some(LoadingKind::Analyzing));

        // Gated while running.
        assert!(!state.begin_analysis(file.path().to_path_buf(), || {}));

        settle(&mut state);
        assert!(state.analysis.is_none());
        assert_eq!(state.loading, None);
        assert_eq!(state.dataset.as_ref().unwrap().row_count, 2);
        assert_eq!(state.dashboard.as_ref().unwrap().title, "Sales");
        assert_eq!(state.filtered_rows.len(), 2);
        assert!(state.notice.is_none());
    }

    #[test]
    fn failed_analysis_discards_the_dataset() {
        let (mut state, _dir) = state(MockGenerator::failing());
        state.set_dashboard(dataset(), sample_config());
        let file = csv_file("Region,Revenue\nNorth,10\n");
        assert!(state.begin_analysis(file.path().to_path_buf(), || {}));
        settle(&mut state);
        assert!(state.dataset.is_none());
        assert!(state.dashboard.is_none());
        assert!(state.filtered_rows.is_empty());
        assert_eq!(state.notice.as_deref(), Some(ANALYSIS_FAILED_MESSAGE));
    }

    #[test]
    fn empty_file_is_fatal_for_the_upload() {
        let (mut state, _dir) = state(MockGenerator::ok());
        let file = csv_file("Region,Revenue\n");
        assert!(state.begin_analysis(file.path().to_path_buf(), || {}));
        settle(&mut state);
        assert!(state.dataset.is_none());
        assert!(state.notice.as_deref().unwrap().contains("no data rows"));
    }

    #[test]
    fn export_always_clears_loading() {
        let (mut state, _dir) = state(MockGenerator::ok());
        assert!(!state.begin_export(PathBuf::from("x.pdf")), "nothing to export yet");

        state.set_dashboard(dataset(), sample_config());
        assert!(state.begin_export(PathBuf::from("x.pdf")));
        assert_eq!(state.loading, Some(LoadingKind::Exporting));
        state.finish_export(Err("disk full".into()));
        assert!(!state.is_loading());
        assert!(state.pending_export.is_none());
        assert!(state.notice.as_deref().unwrap().contains("disk full"));
        assert!(state.dashboard.is_some());

        assert!(state.begin_export(PathBuf::from("y.pdf")));
        state.finish_export(Ok(PathBuf::from("y.pdf")));
        assert!(!state.is_loading());
    }

    #[test]
    fn theme_toggle_is_written_to_the_injected_settings() {
        let (mut state, dir) = state(MockGenerator::ok());
        let before = state.settings.dark_mode;
        state.toggle_dark_mode();
        assert_eq!(state.settings.dark_mode, !before);
        let reloaded = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(reloaded.dark_mode, !before);
    }
}
