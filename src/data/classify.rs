use super::dates::looks_like_date;
use super::model::{cell, CellValue, Dataset};

/// Rows inspected per column.
pub const SAMPLE_WINDOW: usize = 200;

/// Columns with more distinct sampled values get no categorical filter.
pub const MAX_CATEGORIES: usize = 50;

// ---------------------------------------------------------------------------
// Column descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Pick one of a fixed set of values.
    Categorical { options: Vec<String> },
    /// Inclusive start/end date bounds.
    DateRange,
}

/// How one column can be filtered. Derived from the dataset, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn options(&self) -> &[String] {
        match &self.kind {
            ColumnKind::Categorical { options } => options,
            ColumnKind::DateRange => &[],
        }
    }
}

/// Classify every header that can be offered as a filter, in header order.
///
/// Only the first [`SAMPLE_WINDOW`] rows are inspected. A column is a date
/// range when its first non-null sampled value looks like a date; otherwise
/// it is categorical when it has at most [`MAX_CATEGORIES`] distinct values.
/// Anything else (and all-null columns) is left out.
pub fn classify_columns(dataset: &Dataset) -> Vec<ColumnDescriptor> {
    let sample = &dataset.rows[..dataset.rows.len().min(SAMPLE_WINDOW)];

    dataset
        .headers
        .iter()
        .filter_map(|name| {
            let values: Vec<&CellValue> = sample
                .iter()
                .map(|row| cell(row, name))
                .filter(|v| !v.is_null())
                .collect();
            let kind = classify_values(&values)?;
            log::debug!("column {name:?} classified as {kind:?}");
            Some(ColumnDescriptor {
                name: name.clone(),
                kind,
            })
        })
        .collect()
}

fn classify_values(values: &[&CellValue]) -> Option<ColumnKind> {
    let first = values.first()?;

    if let CellValue::String(s) = first {
        if looks_like_date(s) {
            return Some(ColumnKind::DateRange);
        }
    }

    // Distinct by string form, keeping the first original value for sorting.
    let mut distinct: Vec<(&CellValue, String)> = Vec::new();
    for v in values {
        let Some(label) = v.as_filter_string() else {
            continue;
        };
        if distinct.iter().any(|(_, l)| *l == label) {
            continue;
        }
        if distinct.len() == MAX_CATEGORIES {
            return None;
        }
        distinct.push((v, label));
    }

    distinct.sort_by(|(a, _), (b, _)| a.option_cmp(b));
    Some(ColumnKind::Categorical {
        options: distinct.into_iter().map(|(_, label)| label).collect(),
    })
}
