//! Loading project records into a flat table plus a theme table.

use super::ThemeTable;
use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

type Record = Map<String, Value>;

/// Project records as a table of their flat fields.
///
/// Top-level fields holding only strings become `String` columns and fields
/// holding only numbers become `Float64` columns. Nested, boolean or mixed
/// fields are left out of the table.
#[derive(Debug, Clone)]
pub struct ProjectTable {
    pub frame: DataFrame,
    pub themes: ThemeTable,
    record_count: usize,
}

impl ProjectTable {
    /// Load records from a file holding a JSON array or JSON lines.
    pub fn from_path(path: impl AsRef<Path>, theme_field: &str) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading project records from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(AnalysisError::from)
            .context(format!("Reading {}", path.display()))?;
        Self::from_json_str(&text, theme_field)
    }

    /// Parse records from a JSON array or newline-delimited JSON.
    pub fn from_json_str(text: &str, theme_field: &str) -> Result<Self> {
        let records = parse_records(text)?;
        Self::from_records(&records, theme_field)
    }

    fn from_records(records: &[Record], theme_field: &str) -> Result<Self> {
        let frame = flatten(records)?;
        let themes = ThemeTable::from_records(records, theme_field)?;
        info!(
            "Loaded {} records ({} flat columns, {} theme entries)",
            records.len(),
            frame.width(),
            themes.len()
        );
        Ok(Self {
            frame,
            themes,
            record_count: records.len(),
        })
    }

    /// Number of project records.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

fn parse_records(text: &str) -> Result<Vec<Record>> {
    let trimmed = text.trim_start();
    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line)
                    .map_err(AnalysisError::from)
                    .context(format!("Line {}", index + 1))
            })
            .collect::<Result<_>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(map),
            other => Err(AnalysisError::MalformedData(format!(
                "record {} is not an object: {}",
                index, other
            ))),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Unsupported,
}

fn field_kind(records: &[Record], field: &str) -> FieldKind {
    let mut kind = None;
    for value in records.iter().filter_map(|r| r.get(field)) {
        let this = match value {
            Value::Null => continue,
            Value::String(_) => FieldKind::Text,
            Value::Number(_) => FieldKind::Number,
            _ => return FieldKind::Unsupported,
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => return FieldKind::Unsupported,
            Some(_) => {}
        }
    }
    kind.unwrap_or(FieldKind::Unsupported)
}

fn flatten(records: &[Record]) -> Result<DataFrame> {
    let fields: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let mut columns = Vec::new();
    for field in fields {
        match field_kind(records, field) {
            FieldKind::Text => {
                let values: Vec<Option<&str>> = records
                    .iter()
                    .map(|r| r.get(field).and_then(Value::as_str))
                    .collect();
                columns.push(Column::new(field.into(), values));
            }
            FieldKind::Number => {
                let values: Vec<Option<f64>> = records
                    .iter()
                    .map(|r| r.get(field).and_then(Value::as_f64))
                    .collect();
                columns.push(Column::new(field.into(), values));
            }
            FieldKind::Unsupported => debug!("Skipping nested or mixed field '{}'", field),
        }
    }

    if columns.is_empty() && !records.is_empty() {
        warn!("No flat fields found in {} records", records.len());
    }

    DataFrame::new(columns).context("Building project frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{numeric_column, string_column};

    const RECORDS: &str = r#"[
        {"countryshortname": "Kenya", "totalamt": 130000000, "approvalfy": "2013",
         "mjtheme_namecode": [{"code": "8", "name": "Human development"}, {"code": "11", "name": ""}],
         "sector": {"Name": "Education"}},
        {"countryshortname": "Peru", "totalamt": 0, "approvalfy": 2014,
         "mjtheme_namecode": [{"code": "1", "name": "Economic management"}]},
        {"countryshortname": null, "totalamt": 6060000}
    ]"#;

    #[test]
    fn test_flat_columns() {
        let table = ProjectTable::from_json_str(RECORDS, "mjtheme_namecode").unwrap();
        assert_eq!(table.len(), 3);

        let names = string_column(&table.frame, "countryshortname").unwrap();
        assert_eq!(
            names,
            vec![Some("Kenya".to_string()), Some("Peru".to_string()), None]
        );

        let amounts = numeric_column(&table.frame, "totalamt").unwrap();
        assert_eq!(amounts[2], Some(6060000.0));
    }

    #[test]
    fn test_mixed_and_nested_fields_skipped() {
        let table = ProjectTable::from_json_str(RECORDS, "mjtheme_namecode").unwrap();
        // "approvalfy" mixes strings and numbers, "sector" is nested.
        assert!(table.frame.column("approvalfy").is_err());
        assert!(table.frame.column("sector").is_err());
        assert!(table.frame.column("mjtheme_namecode").is_err());
    }

    #[test]
    fn test_themes_extracted() {
        let table = ProjectTable::from_json_str(RECORDS, "mjtheme_namecode").unwrap();
        assert_eq!(table.themes.len(), 3);
        assert_eq!(table.themes.missing_names().unwrap(), 1);
    }

    #[test]
    fn test_json_lines() {
        let text = "{\"countryshortname\": \"Chad\"}\n\n{\"countryshortname\": \"Chad\"}\n";
        let table = ProjectTable::from_json_str(text, "mjtheme_namecode").unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.themes.is_empty());
    }

    #[test]
    fn test_non_object_record_rejected() {
        let err = ProjectTable::from_json_str("[1, 2]", "mjtheme_namecode").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DATA");
    }

    #[test]
    fn test_invalid_json_line_reports_line() {
        let err = ProjectTable::from_json_str("{}\n{oops", "mjtheme_namecode").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
    }
}
