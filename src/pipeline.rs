use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::ai::{AiError, DashboardConfig, DashboardGenerator};
use crate::data::loader::{load_file, LoadError};
use crate::data::model::Dataset;

/// Shown for every generator failure, whatever the cause.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze the file. Please try again.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("analysis worker stopped without a result")]
    WorkerLost,
}

impl AnalysisError {
    /// Text for the user. Generator errors collapse to one message; the
    /// details go to the log.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Load(e) => e.to_string(),
            AnalysisError::Ai(_) | AnalysisError::WorkerLost => ANALYSIS_FAILED_MESSAGE.to_string(),
        }
    }
}

/// What one analysis run produced.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Ready {
        dataset: Dataset,
        config: DashboardConfig,
    },
    Failed(AnalysisError),
}

// ---------------------------------------------------------------------------
// Sequential run: parse → sample → generate
// ---------------------------------------------------------------------------

/// Parse the file, then ask the generator for a dashboard. Each step starts
/// only after the previous one succeeded.
pub fn run_analysis(
    path: &Path,
    generator: &dyn DashboardGenerator,
) -> Result<(Dataset, DashboardConfig), AnalysisError> {
    let dataset = load_file(path)?;
    let config = generator.generate(&dataset)?;

    let unknown = config.unknown_keys(&dataset.headers);
    if !unknown.is_empty() {
        log::warn!("Dashboard references columns not in {}: {unknown:?}", dataset.file_name);
    }
    log::info!(
        "Dashboard {:?} generated with {} charts",
        config.title,
        config.charts.len()
    );
    Ok((dataset, config))
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

/// One in-flight analysis on a worker thread. Dropping the task discards its
/// result.
pub struct AnalysisTask {
    rx: Receiver<AnalysisOutcome>,
}

impl AnalysisTask {
    /// Start the run. `on_done` fires on the worker after the outcome is sent
    /// (used to wake the UI).
    pub fn spawn(
        path: PathBuf,
        generator: Arc<dyn DashboardGenerator>,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let outcome = match run_analysis(&path, generator.as_ref()) {
                Ok((dataset, config)) => AnalysisOutcome::Ready { dataset, config },
                Err(e) => AnalysisOutcome::Failed(e),
            };
            if tx.send(outcome).is_err() {
                log::debug!("analysis of {} finished after its task was dropped", path.display());
            }
            on_done();
        });
        AnalysisTask { rx }
    }

    /// Non-blocking. `None` while the worker is still running.
    pub fn poll(&self) -> Option<AnalysisOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(AnalysisOutcome::Failed(AnalysisError::WorkerLost))
            }
        }
    }
}
