//! Summary statistics over one year of daily records.

use super::StockDataset;
use crate::config::StockColumns;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::frame::{numeric_column, string_column};
use crate::stats::{
    as_present, average, consecutive_changes, fill_missing, max_value, median, min_value,
    round_to, subtract_value_pairs,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Figures computed from a [`StockDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    /// Number of rows (trading days).
    pub trading_days: usize,
    /// Earliest date in the dataset.
    pub first_date: Option<String>,
    /// Latest date in the dataset.
    pub last_date: Option<String>,
    /// Highest opening price, after missing openings were filled with the average.
    pub max_opening: f64,
    /// Lowest opening price, after missing openings were filled with the average.
    pub min_opening: f64,
    /// Largest High - Low spread within a single day.
    pub max_daily_spread: f64,
    /// Largest change between two consecutive days' closing prices.
    ///
    /// `None` when no two consecutive days both have a closing price,
    /// e.g. a single-day range.
    pub max_close_change: Option<f64>,
    /// Largest difference between a day's opening and closing price.
    pub max_open_close_difference: f64,
    /// Average traded volume, ignoring missing days.
    pub average_volume: f64,
    /// Median traded volume, ignoring missing days.
    pub median_volume: f64,
}

impl StockSummary {
    /// Compute the summary using the default column names.
    pub fn from_dataset(dataset: &StockDataset) -> Result<Self> {
        Self::compute(dataset, &StockColumns::default())
    }

    /// Compute the summary with explicit column names.
    pub fn compute(dataset: &StockDataset, columns: &StockColumns) -> Result<Self> {
        let df = &dataset.frame;
        if df.height() == 0 {
            return Err(AnalysisError::NoValidValues(
                "dataset (no trading days)".to_string(),
            ));
        }

        let dates = string_column(df, &columns.date)?;
        let first_date = dates.iter().flatten().min().cloned();
        let last_date = dates.iter().flatten().max().cloned();

        let openings = fill_missing(&numeric_column(df, &columns.open)?)
            .context(format!("Filling column '{}'", columns.open))?;
        let openings = as_present(&openings);
        let max_opening = max_value(&openings).context("Highest opening")?;
        let min_opening = min_value(&openings).context("Lowest opening")?;
        debug!("Opening range: {} .. {}", min_opening, max_opening);

        let highs = numeric_column(df, &columns.high)?;
        let lows = numeric_column(df, &columns.low)?;
        let spreads = subtract_value_pairs(&highs, &lows);
        let max_daily_spread = round_to(
            max_value(&spreads).context("Largest daily spread")?,
            2,
        );

        let closings = numeric_column(df, &columns.close)?;
        let max_close_change = max_value(&consecutive_changes(&closings))
            .ok()
            .map(|change| round_to(change, 2));
        if max_close_change.is_none() {
            debug!("No consecutive closing prices; closing change left empty");
        }
        let max_open_close_difference = round_to(
            max_value(&subtract_value_pairs(&openings, &closings))
                .context("Largest open/close difference")?,
            2,
        );

        let volumes = numeric_column(df, &columns.volume)?;
        let average_volume = average(&volumes).context(format!("Averaging '{}'", columns.volume))?;
        let median_volume = median(&volumes).context(format!("Median of '{}'", columns.volume))?;

        info!(
            "Summarized {} trading days ({} to {})",
            df.height(),
            first_date.as_deref().unwrap_or("?"),
            last_date.as_deref().unwrap_or("?")
        );

        Ok(Self {
            trading_days: df.height(),
            first_date,
            last_date,
            max_opening,
            min_opening,
            max_daily_spread,
            max_close_change,
            max_open_close_difference,
            average_volume,
            median_volume,
        })
    }
}
