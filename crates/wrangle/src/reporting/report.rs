//! Serializable reports and writing them to disk.

use crate::error::{AnalysisError, Result, ResultExt};
use crate::projects::ProjectsAnalysis;
use crate::stock::{StockDataset, StockSummary};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

fn timestamp() -> String {
    Local::now().to_rfc3339()
}

/// Report for the stock summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Request URL (without API key) or input file
    pub source: String,
    /// Dataset name as reported by the API
    pub dataset_name: Option<String>,
    /// "DATABASE/DATASET" when both codes are known
    pub dataset_code: Option<String>,
    /// Range covered by the dataset, as reported by the API
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: StockSummary,
}

impl StockReport {
    pub fn new(source: impl Into<String>, dataset: &StockDataset, summary: StockSummary) -> Self {
        let dataset_code = match (&dataset.database_code, &dataset.dataset_code) {
            (Some(db), Some(ds)) => Some(format!("{}/{}", db, ds)),
            (None, Some(ds)) => Some(ds.clone()),
            _ => None,
        };
        Self {
            generated_at: timestamp(),
            source: source.into(),
            dataset_name: dataset.name.clone(),
            dataset_code,
            start_date: dataset.start_date.clone(),
            end_date: dataset.end_date.clone(),
            summary,
        }
    }

    /// Human-readable rendering for the terminal.
    pub fn to_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            "=".repeat(60),
            "STOCK SUMMARY".to_string(),
            "=".repeat(60),
            format!("Source:  {}", self.source),
        ];
        if let Some(ref name) = self.dataset_name {
            lines.push(format!("Dataset: {}", name));
        }
        lines.push(format!(
            "Period:  {} .. {} ({} trading days)",
            s.first_date.as_deref().unwrap_or("?"),
            s.last_date.as_deref().unwrap_or("?"),
            s.trading_days
        ));
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            lines.push(format!("Range:   {} .. {} (requested)", start, end));
        }
        lines.push(String::new());
        let figures = [
            ("Highest opening price", Some(s.max_opening)),
            ("Lowest opening price", Some(s.min_opening)),
            ("Largest daily spread", Some(s.max_daily_spread)),
            ("Largest day-to-day close move", s.max_close_change),
            ("Largest open/close difference", Some(s.max_open_close_difference)),
            ("Average traded volume", Some(s.average_volume)),
            ("Median traded volume", Some(s.median_volume)),
        ];
        for (label, value) in figures {
            let label = format!("{}:", label);
            match value {
                Some(value) => lines.push(format!("  {:<31}{:>14.2}", label, value)),
                None => lines.push(format!("  {:<31}{:>14}", label, "n/a")),
            }
        }
        lines.join("\n")
    }
}

/// Report for the project frequency analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    #[serde(flatten)]
    pub analysis: ProjectsAnalysis,
}

impl ProjectsReport {
    pub fn new(input_file: impl Into<String>, analysis: ProjectsAnalysis) -> Self {
        Self {
            generated_at: timestamp(),
            input_file: input_file.into(),
            analysis,
        }
    }
}

/// Writes reports as pretty-printed JSON into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `report` to `<output_dir>/<base_name>_report.json`.
    pub fn write<T: Serialize>(&self, report: &T, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_report.json", base_name));
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path)?;
        file.write_all(json.as_bytes())
            .map_err(AnalysisError::from)
            .context(format!("Writing {}", report_path.display()))?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}
