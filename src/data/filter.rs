use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use super::model::{cell, Row, SharedRow};

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// A restriction on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterConstraint {
    /// Coerced cell text must equal this value exactly.
    Category(String),
    /// Inclusive calendar-date bounds; `None` is unbounded on that side.
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl FilterConstraint {
    /// An unselected constraint filters nothing and is never stored.
    pub fn is_unset(&self) -> bool {
        match self {
            FilterConstraint::Category(v) => v.is_empty(),
            FilterConstraint::DateRange { start, end } => start.is_none() && end.is_none(),
        }
    }

    /// Whether a row passes this constraint on `column`.
    pub fn matches(&self, row: &Row, column: &str) -> bool {
        let value = cell(row, column);
        match self {
            FilterConstraint::Category(selected) => {
                value.as_filter_string().as_deref() == Some(selected.as_str())
            }
            FilterConstraint::DateRange { start, end } => {
                let Some(date) = value.as_datetime().map(|dt| dt.date()) else {
                    return false;
                };
                start.map_or(true, |s| s <= date) && end.map_or(true, |e| date <= e)
            }
        }
    }
}

/// Active constraints keyed by column. Empty means "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters {
    constraints: BTreeMap<String, FilterConstraint>,
}

impl ActiveFilters {
    /// Set or clear the constraint on a column. An unset constraint removes
    /// the entry instead of storing it.
    pub fn set(&mut self, column: &str, constraint: FilterConstraint) {
        if constraint.is_unset() {
            self.constraints.remove(column);
        } else {
            self.constraints.insert(column.to_string(), constraint);
        }
    }

    pub fn get(&self, column: &str) -> Option<&FilterConstraint> {
        self.constraints.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterConstraint)> {
        self.constraints.iter()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return the rows that satisfy every active constraint, in input order.
///
/// With no constraints the input `Arc` itself is returned, so unchanged
/// views share one allocation. Kept rows are shared with the input.
pub fn apply_filters(rows: &Arc<Vec<SharedRow>>, filters: &ActiveFilters) -> Arc<Vec<SharedRow>> {
    if filters.is_empty() {
        return Arc::clone(rows);
    }

    let kept: Vec<SharedRow> = rows
        .iter()
        .filter(|row| {
            filters
                .iter()
                .all(|(column, constraint)| constraint.matches(row, column))
        })
        .cloned()
        .collect();
    Arc::new(kept)
}
