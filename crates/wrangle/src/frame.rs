//! Shared DataFrame utilities.
//!
//! Helpers for pulling typed columns out of a polars [`DataFrame`] and for
//! frequency counting over string columns.

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Column extraction
// =============================================================================

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| AnalysisError::ColumnNotFound(name.to_string()))
}

/// Read a column as `f64` values, keeping nulls as `None`.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = series(df, name)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Read a column as owned strings, keeping nulls as `None`.
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = series(df, name)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

// =============================================================================
// Frequency counts
// =============================================================================

/// A category and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

impl FrequencyEntry {
    pub fn new(value: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Count occurrences of each value in a string column.
///
/// Entries are ordered by count descending, then by value ascending.
/// Nulls are not counted.
pub fn value_counts(df: &DataFrame, name: &str) -> Result<Vec<FrequencyEntry>> {
    let values = string_column(df, name)?;
    Ok(count_values(values.iter().flatten().map(String::as_str)))
}

/// Count occurrences of each value and order them for display.
pub fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<FrequencyEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .map(|(value, count)| FrequencyEntry::new(value, count))
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries
}

/// The `n` most frequent values of a string column.
pub fn top_n(df: &DataFrame, name: &str, n: usize) -> Result<Vec<FrequencyEntry>> {
    let mut entries = value_counts(df, name)?;
    entries.truncate(n);
    Ok(entries)
}
