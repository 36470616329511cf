//! Development-project records: loading, frequency counts and theme repair.
//!
//! # Example
//!
//! ```rust,ignore
//! use wrangle::{ProjectTable, ProjectsConfig, projects::analyze};
//!
//! let config = ProjectsConfig::default();
//! let mut table = ProjectTable::from_path("data/world_bank_projects.json", &config.theme_field)?;
//! let analysis = analyze(&mut table, &config)?;
//! println!("{:?}", analysis.top_countries);
//! ```

mod loader;
mod themes;

pub use loader::ProjectTable;
pub use themes::{FillOutcome, ThemeTable};

use crate::config::ProjectsConfig;
use crate::error::{Result, ResultExt};
use crate::frame::{FrequencyEntry, top_n};
use serde::{Deserialize, Serialize};

/// Frequency counts produced from a [`ProjectTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectsAnalysis {
    pub record_count: usize,
    pub theme_entries: usize,
    pub top_countries: Vec<FrequencyEntry>,
    pub top_themes_before_fill: Vec<FrequencyEntry>,
    pub fill: FillOutcome,
    pub top_themes_after_fill: Vec<FrequencyEntry>,
}

/// Count countries and themes, repair missing theme names, recount themes.
///
/// The theme table of `table` is left sorted and filled.
pub fn analyze(table: &mut ProjectTable, config: &ProjectsConfig) -> Result<ProjectsAnalysis> {
    let top_countries = top_n(&table.frame, &config.country_field, config.top_n)
        .context("Counting projects per country")?;
    let top_themes_before_fill = table.themes.top_names(config.top_n)?;
    let fill = table.themes.fill_missing_names(config.fill_scope)?;
    let top_themes_after_fill = table.themes.top_names(config.top_n)?;

    Ok(ProjectsAnalysis {
        record_count: table.len(),
        theme_entries: table.themes.len(),
        top_countries,
        top_themes_before_fill,
        fill,
        top_themes_after_fill,
    })
}
