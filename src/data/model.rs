use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};

use super::dates::parse_date;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as produced by the file parsers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// String form used for categorical comparison and option labels.
    /// `Null` has none.
    pub fn as_filter_string(&self) -> Option<String> {
        match self {
            CellValue::String(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Null => None,
        }
    }

    /// Interpret the value as a point in time.
    ///
    /// Numbers are taken as milliseconds since the Unix epoch; strings go
    /// through [`parse_date`].
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::String(s) => parse_date(s),
            CellValue::Number(n) if n.is_finite() => {
                DateTime::from_timestamp_millis(*n as i64).map(|dt| dt.naive_utc())
            }
            _ => None,
        }
    }

    /// Numeric view for chart axes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Null => None,
        }
    }

    /// Ordering used for categorical options: numbers numerically, everything
    /// else by string form. Numbers sort before non-numbers.
    pub fn option_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,
            _ => self
                .as_filter_string()
                .unwrap_or_default()
                .cmp(&other.as_filter_string().unwrap_or_default()),
        }
    }
}

/// Integers print without a fractional part, everything else uses the
/// shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_filter_string() {
            Some(s) => write!(f, "{s}"),
            None => write!(f, ""),
        }
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(val: &serde_json::Value) -> Self {
        match val {
            serde_json::Value::String(s) => CellValue::String(s.clone()),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::String(n.to_string())),
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Null => CellValue::Null,
            other => CellValue::String(other.to_string()),
        }
    }
}

impl From<&CellValue> for serde_json::Value {
    fn from(val: &CellValue) -> Self {
        match val {
            CellValue::String(s) => serde_json::Value::String(s.clone()),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Null => serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Row – one record of the parsed sheet
// ---------------------------------------------------------------------------

/// Column name → value. Rows are not required to carry every header.
pub type Row = BTreeMap<String, CellValue>;

/// A row as held by a [`Dataset`]. Filtered views clone the handle, never
/// the cells.
pub type SharedRow = Arc<Row>;

static NULL: CellValue = CellValue::Null;

/// Read a cell, treating a missing key as `Null`.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&NULL)
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The parsed file. Immutable once built; the next load replaces it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub file_name: String,
    /// Column names in file order.
    pub headers: Vec<String>,
    /// Shared so that an unfiltered view can hand out the same allocation.
    pub rows: Arc<Vec<SharedRow>>,
    pub row_count: usize,
}

impl Dataset {
    pub fn new(file_name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Dataset {
            file_name: file_name.into(),
            headers,
            rows: Arc::new(rows.into_iter().map(Arc::new).collect()),
            row_count,
        }
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_coerce_without_decimal_point() {
        assert_eq!(CellValue::Number(2020.0).as_filter_string().unwrap(), "2020");
        assert_eq!(CellValue::Number(-3.0).as_filter_string().unwrap(), "-3");
        assert_eq!(CellValue::Number(1.5).as_filter_string().unwrap(), "1.5");
        assert_eq!(CellValue::Bool(true).as_filter_string().unwrap(), "true");
        assert!(CellValue::Null.as_filter_string().is_none());
    }

    #[test]
    fn option_ordering_is_numeric_for_numbers() {
        let mut vals = vec![
            CellValue::Number(10.0),
            CellValue::Number(9.0),
            CellValue::String("b".into()),
            CellValue::Number(100.0),
            CellValue::String("a".into()),
        ];
        vals.sort_by(CellValue::option_cmp);
        let labels: Vec<String> = vals.iter().map(|v| v.to_string()).collect();
        assert_eq!(labels, ["9", "10", "100", "a", "b"]);
    }

    #[test]
    fn missing_cell_reads_as_null() {
        let mut row = Row::new();
        row.insert("a".into(), CellValue::Number(1.0));
        assert_eq!(cell(&row, "a"), &CellValue::Number(1.0));
        assert!(cell(&row, "missing").is_null());
    }

    #[test]
    fn numbers_are_epoch_millis_as_dates() {
        let dt = CellValue::Number(0.0).as_datetime().unwrap();
        assert_eq!(dt.to_string(), "1970-01-01 00:00:00");
        assert!(CellValue::Bool(true).as_datetime().is_none());
    }

    #[test]
    fn json_round_trip_keeps_scalar_kinds() {
        let v = serde_json::json!({"n": 3, "s": "x", "b": false, "z": null});
        let obj = v.as_object().unwrap();
        assert_eq!(CellValue::from(&obj["n"]), CellValue::Number(3.0));
        assert_eq!(CellValue::from(&obj["s"]), CellValue::String("x".into()));
        assert_eq!(CellValue::from(&obj["b"]), CellValue::Bool(false));
        assert_eq!(CellValue::from(&obj["z"]), CellValue::Null);
        assert_eq!(serde_json::Value::from(&CellValue::Number(3.0)), serde_json::json!(3.0));
    }
}
