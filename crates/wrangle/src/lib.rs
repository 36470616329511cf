//! Stock-exchange summaries and development-project frequency analysis.
//!
//! Two small analyses built on polars:
//!
//! - **Stock summary**: fetch a year of daily records for one dataset from a
//!   Quandl-style REST API (or load a saved response), pivot the rows into
//!   columns and compute max/min openings, spreads, average and median volume.
//! - **Project frequencies**: load World Bank project records from JSON,
//!   count projects per country and per theme, and fill missing theme names
//!   by sorting on theme code and back-filling.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use wrangle::{StockDataset, StockSummary};
//!
//! let dataset = StockDataset::from_path("afx_x_2017.json")?;
//! let summary = StockSummary::from_dataset(&dataset)?;
//! println!("Median volume: {}", summary.median_volume);
//! ```
//!
//! # Modules
//!
//! - [`stats`]: list statistics over columns with missing values
//! - [`stock`]: dataset fetching, parsing and the summary
//! - [`projects`]: project loading, frequency counts and theme repair
//! - [`reporting`]: JSON reports and text bar charts
//! - [`config`]: validated configuration builders
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod frame;
pub mod projects;
pub mod reporting;
pub mod stats;
pub mod stock;

pub use config::{
    ConfigValidationError, FillScope, ProjectsConfig, ProjectsConfigBuilder, StockColumns,
    StockQuery, StockQueryBuilder,
};
pub use error::{AnalysisError, Result, ResultExt};
pub use frame::FrequencyEntry;
pub use projects::{FillOutcome, ProjectTable, ProjectsAnalysis, ThemeTable};
pub use reporting::{BarChart, ProjectsReport, ReportWriter, StockReport};
#[cfg(feature = "fetch")]
pub use stock::StockClient;
pub use stock::{StockDataset, StockSummary};
