//! AI: asks a hosted model to lay out a dashboard for a dataset.
//!
//! `DashboardGenerator` is the seam: the pipeline only sees the trait, the
//! Gemini client is the production implementation.

pub mod client;
pub mod prompt;
pub mod types;

pub use client::GeminiClient;
pub use types::{AiError, ChartKind, ChartSpec, DashboardConfig, DashboardGenerator};
