//! Parsing of dataset responses and pivoting rows into columns.

use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct DatasetEnvelope {
    dataset: RawDataset,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    database_code: Option<String>,
    #[serde(default)]
    dataset_code: Option<String>,
    #[serde(default)]
    frequency: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    column_names: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// Error body returned by the API, e.g. for an unknown dataset code.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) quandl_error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub(crate) code: String,
    pub(crate) message: String,
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// One dataset of daily records, stored column-wise.
///
/// The first column (the trading date) is kept as strings; every other
/// column is `Float64` with nulls for missing cells. Rows are ordered by
/// date ascending regardless of the order the API returned them in.
#[derive(Debug, Clone)]
pub struct StockDataset {
    pub name: Option<String>,
    pub database_code: Option<String>,
    pub dataset_code: Option<String>,
    pub frequency: Option<String>,
    /// First day of the range the API served, when reported.
    pub start_date: Option<String>,
    /// Last day of the range the API served, when reported.
    pub end_date: Option<String>,
    pub column_names: Vec<String>,
    pub frame: DataFrame,
}

impl StockDataset {
    /// Parse a response body.
    pub fn from_json_str(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Load a response body previously saved to disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(AnalysisError::from)
            .context(format!("Reading {}", path.display()))?;
        Self::from_json_str(&body)
    }

    /// Build a dataset from an already-decoded JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("quandl_error").is_some() {
            let envelope: ErrorEnvelope = serde_json::from_value(value)?;
            return Err(AnalysisError::MalformedData(format!(
                "response carries an API error: {}",
                envelope.quandl_error
            )));
        }

        let envelope: DatasetEnvelope = serde_json::from_value(value)?;
        let raw = envelope.dataset;
        let frame = pivot(&raw.column_names, &raw.data)?;

        debug!(
            "Pivoted {} rows into {} columns",
            frame.height(),
            frame.width()
        );

        Ok(Self {
            name: raw.name,
            database_code: raw.database_code,
            dataset_code: raw.dataset_code,
            frequency: raw.frequency,
            start_date: raw.start_date,
            end_date: raw.end_date,
            column_names: raw.column_names,
            frame,
        })
    }

    /// Number of trading days in the dataset.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Turn row-major records into one column per name.
fn pivot(column_names: &[String], rows: &[Vec<Value>]) -> Result<DataFrame> {
    let Some((key_name, value_names)) = column_names.split_first() else {
        return Err(AnalysisError::MalformedData(
            "dataset has no columns".to_string(),
        ));
    };

    for (index, row) in rows.iter().enumerate() {
        if row.len() != column_names.len() {
            return Err(AnalysisError::MalformedData(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                column_names.len()
            )));
        }
    }

    let keys: Vec<Option<String>> = rows.iter().map(|row| key_cell(&row[0])).collect();
    let mut columns = Vec::with_capacity(column_names.len());
    columns.push(Column::new(key_name.as_str().into(), keys));

    for (offset, name) in value_names.iter().enumerate() {
        let values: Vec<Option<f64>> = rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| numeric_cell(&row[offset + 1], name, row_index))
            .collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    let frame = DataFrame::new(columns).context("Building dataset frame")?;
    frame
        .sort(
            vec![key_name.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .context("Sorting dataset by date")
}

fn key_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn numeric_cell(value: &Value, column: &str, row: usize) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let parsed = s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            if parsed.is_none() {
                warn!(
                    "Non-numeric value '{}' in column '{}' (row {}); treating as missing",
                    s, column, row
                );
            }
            parsed
        }
        other => {
            warn!(
                "Unexpected value {} in column '{}' (row {}); treating as missing",
                other, column, row
            );
            None
        }
    }
}
