//! Dashboard configuration returned by the generator, and its errors.

use serde::{Deserialize, Serialize};

use crate::data::model::Dataset;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while asking the model for a dashboard.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request failed before a response arrived.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The model answered with no text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The response text was not a valid dashboard configuration.
    #[error("API response parse failed: {0}")]
    ApiParse(String),
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Pie,
        ChartKind::Scatter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
        }
    }
}

/// One chart suggested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Column used for categories / the horizontal axis.
    #[serde(rename = "xKey")]
    pub x_key: String,
    /// Columns plotted as series. Never empty.
    #[serde(rename = "yKeys")]
    pub y_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub charts: Vec<ChartSpec>,
}

impl DashboardConfig {
    /// Structural checks the response schema cannot express.
    pub fn validate(&self) -> Result<(), AiError> {
        if let Some(chart) = self.charts.iter().find(|c| c.y_keys.is_empty()) {
            return Err(AiError::ApiParse(format!(
                "chart {:?} has no yKeys",
                chart.id
            )));
        }
        Ok(())
    }

    /// Chart keys that do not name a column of `headers`.
    pub fn unknown_keys(&self, headers: &[String]) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for chart in &self.charts {
            for key in std::iter::once(&chart.x_key).chain(chart.y_keys.iter()) {
                if !headers.contains(key) && !unknown.contains(key) {
                    unknown.push(key.clone());
                }
            }
        }
        unknown
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

/// Anything that can turn a dataset into a dashboard configuration.
///
/// Implemented by the HTTP client and by test doubles.
pub trait DashboardGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`AiError`] if the request fails or the answer is unusable.
    fn generate(&self, dataset: &Dataset) -> Result<DashboardConfig, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(json: serde_json::Value) -> DashboardConfig {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn deserializes_wire_names() {
        let cfg = config(serde_json::json!({
            "title": "Sales",
            "summary": "Revenue by region",
            "charts": [{
                "id": "c1", "type": "bar", "title": "Revenue",
                "description": "per region", "xKey": "Region", "yKeys": ["Revenue", "Cost"]
            }]
        }));
        assert_eq!(cfg.charts[0].kind, ChartKind::Bar);
        assert_eq!(cfg.charts[0].x_key, "Region");
        assert_eq!(cfg.charts[0].y_keys, ["Revenue", "Cost"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_chart_type_is_rejected() {
        let res = serde_json::from_value::<DashboardConfig>(serde_json::json!({
            "title": "t", "summary": "s",
            "charts": [{ "id": "c", "type": "radar", "title": "t", "xKey": "a", "yKeys": ["b"] }]
        }));
        assert!(res.is_err());
    }

    #[test]
    fn empty_y_keys_fail_validation() {
        let cfg = config(serde_json::json!({
            "title": "t", "summary": "s",
            "charts": [{ "id": "c", "type": "line", "title": "t", "xKey": "a", "yKeys": [] }]
        }));
        assert!(matches!(cfg.validate(), Err(AiError::ApiParse(_))));
    }

    #[test]
    fn reports_keys_missing_from_headers() {
        let cfg = config(serde_json::json!({
            "title": "t", "summary": "s",
            "charts": [
                { "id": "a", "type": "line", "title": "t", "xKey": "Date", "yKeys": ["Sales", "Profit"] },
                { "id": "b", "type": "pie", "title": "t", "xKey": "Region", "yKeys": ["Profit"] }
            ]
        }));
        let headers = vec!["Date".to_string(), "Sales".to_string(), "Region".to_string()];
        assert_eq!(cfg.unknown_keys(&headers), ["Profit"]);
    }
}
