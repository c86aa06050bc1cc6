//! Request text and response schema for dashboard generation.

use serde_json::{json, Map, Value};

use super::types::ChartKind;
use crate::data::model::Dataset;

/// Rows included verbatim in the prompt.
pub const PROMPT_SAMPLE_ROWS: usize = 50;

/// Serialise headers, the total row count and the first rows as JSON.
pub fn build_prompt(dataset: &Dataset) -> String {
    let sample: Vec<Value> = dataset
        .rows
        .iter()
        .take(PROMPT_SAMPLE_ROWS)
        .map(|row| {
            let obj: Map<String, Value> = dataset
                .headers
                .iter()
                .filter_map(|h| row.get(h).map(|v| (h.clone(), Value::from(v))))
                .collect();
            Value::Object(obj)
        })
        .collect();

    let headers = Value::from(dataset.headers.clone());
    let sample = Value::Array(sample);

    format!(
        "You are a data analyst. Design a dashboard for the spreadsheet \"{file}\".\n\
         Columns: {headers}\n\
         Total rows: {count}\n\
         First {n} rows (JSON):\n{sample}\n\n\
         Return a short title, a one-paragraph summary of what the data shows, \
         and between 2 and 6 charts. Each chart must use existing column names \
         for xKey and yKeys; yKeys must be numeric columns. \
         Chart type must be one of: {kinds}.",
        file = dataset.file_name,
        count = dataset.row_count,
        n = dataset.rows.len().min(PROMPT_SAMPLE_ROWS),
        kinds = ChartKind::ALL
            .iter()
            .map(ChartKind::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Response schema in the generator's OpenAPI subset.
pub fn response_schema() -> Value {
    let kinds: Vec<&str> = ChartKind::ALL.iter().map(ChartKind::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "charts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": kinds },
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "xKey": { "type": "STRING" },
                        "yKeys": { "type": "ARRAY", "items": { "type": "STRING" } }
                    },
                    "required": ["id", "type", "title", "description", "xKey", "yKeys"]
                }
            }
        },
        "required": ["title", "summary", "charts"]
    })
}
