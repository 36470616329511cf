//! Report generation module.
//!
//! [`StockReport`] and [`ProjectsReport`] serialize to JSON for `--json`
//! output and for files written with [`ReportWriter`]. [`BarChart`] renders
//! frequency counts for the terminal.

mod chart;
mod report;

pub use chart::{BarChart, DEFAULT_BAR_WIDTH};
pub use report::{ProjectsReport, ReportWriter, StockReport};
