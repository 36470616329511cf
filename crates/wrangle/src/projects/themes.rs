//! Theme entries and the sort-then-fill repair of missing theme names.

use crate::config::FillScope;
use crate::error::{Result, ResultExt};
use crate::frame::{FrequencyEntry, string_column, top_n};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

const CODE: &str = "code";
const NAME: &str = "name";

/// Result of [`ThemeTable::fill_missing_names`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOutcome {
    pub scope: FillScope,
    pub missing_before: usize,
    pub filled: usize,
    pub still_missing: usize,
}

/// One row per `{code, name}` theme entry across all projects.
///
/// Empty names are stored as nulls.
#[derive(Debug, Clone)]
pub struct ThemeTable {
    pub frame: DataFrame,
}

impl ThemeTable {
    /// Collect theme entries from the list held in `field` of each record.
    pub fn from_records(records: &[Map<String, Value>], field: &str) -> Result<Self> {
        let mut codes: Vec<Option<String>> = Vec::new();
        let mut names: Vec<Option<String>> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let entries = match record.get(field) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(entries)) => entries,
                Some(other) => {
                    warn!(
                        "Record {} has a non-list '{}' field ({}); skipping",
                        index, field, other
                    );
                    continue;
                }
            };

            for entry in entries {
                codes.push(entry.get(CODE).and_then(code_text));
                names.push(
                    entry
                        .get(NAME)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                );
            }
        }

        Self::from_columns(codes, names)
    }

    /// Build a table from parallel code and name columns.
    pub fn from_columns(codes: Vec<Option<String>>, names: Vec<Option<String>>) -> Result<Self> {
        let frame = DataFrame::new(vec![
            Column::new(CODE.into(), codes),
            Column::new(NAME.into(), names),
        ])
        .context("Building theme frame")?;
        Ok(Self { frame })
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Number of entries without a name.
    pub fn missing_names(&self) -> Result<usize> {
        Ok(self.frame.column(NAME)?.null_count())
    }

    /// The `n` most frequent theme names; unnamed entries are not counted.
    pub fn top_names(&self, n: usize) -> Result<Vec<FrequencyEntry>> {
        top_n(&self.frame, NAME, n)
    }

    /// Fill missing names from other entries of the same code.
    ///
    /// The table is sorted by code then name with nulls first, so every
    /// unnamed entry sits directly above the named entries of its code and a
    /// backward fill picks up the right name. The table stays sorted
    /// afterwards.
    pub fn fill_missing_names(&mut self, scope: FillScope) -> Result<FillOutcome> {
        let mut sorted = self
            .frame
            .sort(
                vec![CODE, NAME],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .context("Sorting themes by code and name")?;

        let missing_before = sorted.column(NAME)?.null_count();

        let filled = match scope {
            FillScope::Global => sorted
                .column(NAME)?
                .as_materialized_series()
                .fill_null(FillNullStrategy::Backward(None))?,
            FillScope::WithinCode => {
                let codes = string_column(&sorted, CODE)?;
                let names = string_column(&sorted, NAME)?;
                Series::new(NAME.into(), backward_fill_within(&codes, &names))
            }
        };
        sorted.replace(NAME, filled)?;

        let still_missing = sorted.column(NAME)?.null_count();
        self.frame = sorted;

        let outcome = FillOutcome {
            scope,
            missing_before,
            filled: missing_before - still_missing,
            still_missing,
        };
        info!(
            "Filled {} of {} missing theme names ({:?})",
            outcome.filled, missing_before, scope
        );
        if still_missing > 0 {
            debug!("{} theme entries have no named sibling", still_missing);
        }

        Ok(outcome)
    }
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Backward fill `names`, never carrying a name into a different code.
fn backward_fill_within(codes: &[Option<String>], names: &[Option<String>]) -> Vec<Option<String>> {
    let mut filled = vec![None; names.len()];
    let mut carried: Option<(&Option<String>, &String)> = None;

    for index in (0..names.len()).rev() {
        let code = &codes[index];
        if let Some(name) = &names[index] {
            carried = Some((code, name));
            filled[index] = Some(name.clone());
        } else if let Some((carried_code, name)) = carried
            && carried_code == code
        {
            filled[index] = Some(name.clone());
        }
    }

    filled
}
