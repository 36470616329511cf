//! Configuration types for the stock and project analyses.
//!
//! Every configuration has a validated builder and (de)serializes with serde,
//! so it can be built from CLI flags or read from a JSON document.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default Quandl-style API endpoint for datasets.
pub const DEFAULT_BASE_URL: &str = "https://www.quandl.com/api/v3/datasets";

/// Default database code (Frankfurt Stock Exchange).
pub const DEFAULT_DATABASE_CODE: &str = "FSE";

/// Default dataset code (Carl Zeiss Meditec).
pub const DEFAULT_DATASET_CODE: &str = "AFX_X";

/// Default timeout for API requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "QUANDL_API_KEY";

/// Default number of categories in a frequency chart.
pub const DEFAULT_TOP_N: usize = 10;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("Invalid regex: dataset code"));

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 12, 31).unwrap_or_default()
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid {field} '{value}' (expected upper-case letters, digits or '_')")]
    InvalidCode { field: String, value: String },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid timeout: {0} (must be at least 1 second)")]
    InvalidTimeout(u64),

    #[error("Invalid top-n: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Field name for '{0}' must not be empty")]
    EmptyField(String),
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(err.to_string())
    }
}

// ============================================================================
// Stock query
// ============================================================================

/// Which dataset to request, and over which date range.
///
/// # Example
///
/// ```rust,ignore
/// use wrangle::config::StockQuery;
///
/// let query = StockQuery::builder()
///     .dataset_code("AFX_X")
///     .api_key("secret")
///     .build()?;
/// println!("{}", query.url());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuery {
    /// Base URL of the datasets endpoint (no trailing slash).
    pub base_url: String,
    /// Database code, e.g. "FSE".
    pub database_code: String,
    /// Dataset code, e.g. "AFX_X".
    pub dataset_code: String,
    /// First day of the requested range (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the requested range (inclusive).
    pub end_date: NaiveDate,
    /// API key; requests are sent anonymously when absent.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StockQuery {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_code: DEFAULT_DATABASE_CODE.to_string(),
            dataset_code: DEFAULT_DATASET_CODE.to_string(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl StockQuery {
    /// Create a new query builder.
    pub fn builder() -> StockQueryBuilder {
        StockQueryBuilder::default()
    }

    /// Validate the query and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("database code", &self.database_code),
            ("dataset code", &self.dataset_code),
        ] {
            if !CODE_PATTERN.is_match(value) {
                return Err(ConfigValidationError::InvalidCode {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        if self.start_date > self.end_date {
            return Err(ConfigValidationError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout(self.timeout_secs));
        }

        Ok(())
    }

    /// Full request URL, including the percent-encoded API key when one is set.
    pub fn url(&self) -> String {
        let mut url = self.redacted_url();
        if let Some(ref key) = self.api_key {
            url.push_str("&api_key=");
            url.push_str(&utf8_percent_encode(key, NON_ALPHANUMERIC).to_string());
        }
        url
    }

    /// Request URL without the API key, safe to log or store in reports.
    pub fn redacted_url(&self) -> String {
        format!(
            "{}/{}/{}.json?start_date={}&end_date={}",
            self.base_url.trim_end_matches('/'),
            self.database_code,
            self.dataset_code,
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d"),
        )
    }
}

/// Builder for [`StockQuery`] with fluent API.
#[derive(Debug, Default)]
pub struct StockQueryBuilder {
    base_url: Option<String>,
    database_code: Option<String>,
    dataset_code: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

impl StockQueryBuilder {
    /// Set a custom base URL (useful for proxies or mirrors).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the database code.
    pub fn database_code(mut self, code: impl Into<String>) -> Self {
        self.database_code = Some(code.into());
        self
    }

    /// Set the dataset code.
    pub fn dataset_code(mut self, code: impl Into<String>) -> Self {
        self.dataset_code = Some(code.into());
        self
    }

    /// Set the first day of the range.
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Set the last day of the range.
    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Set the API key. Empty keys are ignored.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.api_key = Some(key);
        }
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the query.
    ///
    /// Returns a validated `StockQuery` or an error if validation fails.
    pub fn build(self) -> Result<StockQuery, ConfigValidationError> {
        let query = StockQuery {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_code: self
                .database_code
                .unwrap_or_else(|| DEFAULT_DATABASE_CODE.to_string()),
            dataset_code: self
                .dataset_code
                .unwrap_or_else(|| DEFAULT_DATASET_CODE.to_string()),
            start_date: self.start_date.unwrap_or_else(default_start_date),
            end_date: self.end_date.unwrap_or_else(default_end_date),
            api_key: self.api_key,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        query.validate()?;
        Ok(query)
    }
}

// ============================================================================
// Stock columns
// ============================================================================

/// Column names used by the stock summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockColumns {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl Default for StockColumns {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            open: "Open".to_string(),
            high: "High".to_string(),
            low: "Low".to_string(),
            close: "Close".to_string(),
            volume: "Traded Volume".to_string(),
        }
    }
}

// ============================================================================
// Projects
// ============================================================================

/// How far a backward fill of missing theme names may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FillScope {
    /// Only copy names from rows with the same theme code
    #[default]
    WithinCode,
    /// Plain backward fill over the whole sorted column
    Global,
}

/// Configuration for the project frequency analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// Number of categories shown per frequency chart.
    /// Default: 10
    pub top_n: usize,

    /// Scope of the missing-name fill.
    /// Default: WithinCode
    pub fill_scope: FillScope,

    /// Field counted for the country chart.
    /// Default: "countryshortname"
    pub country_field: String,

    /// Field holding the list of `{code, name}` theme entries.
    /// Default: "mjtheme_namecode"
    pub theme_field: String,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            fill_scope: FillScope::default(),
            country_field: "countryshortname".to_string(),
            theme_field: "mjtheme_namecode".to_string(),
        }
    }
}

impl ProjectsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProjectsConfigBuilder {
        ProjectsConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }
        if self.country_field.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("country".to_string()));
        }
        if self.theme_field.trim().is_empty() {
            return Err(ConfigValidationError::EmptyField("theme".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`ProjectsConfig`].
#[derive(Debug, Default)]
pub struct ProjectsConfigBuilder {
    top_n: Option<usize>,
    fill_scope: Option<FillScope>,
    country_field: Option<String>,
    theme_field: Option<String>,
}

impl ProjectsConfigBuilder {
    /// Set how many categories each chart shows.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the fill scope for missing theme names.
    pub fn fill_scope(mut self, scope: FillScope) -> Self {
        self.fill_scope = Some(scope);
        self
    }

    /// Set the field counted for the country chart.
    pub fn country_field(mut self, field: impl Into<String>) -> Self {
        self.country_field = Some(field.into());
        self
    }

    /// Set the field holding theme entries.
    pub fn theme_field(mut self, field: impl Into<String>) -> Self {
        self.theme_field = Some(field.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ProjectsConfig, ConfigValidationError> {
        let defaults = ProjectsConfig::default();
        let config = ProjectsConfig {
            top_n: self.top_n.unwrap_or(defaults.top_n),
            fill_scope: self.fill_scope.unwrap_or_default(),
            country_field: self.country_field.unwrap_or(defaults.country_field),
            theme_field: self.theme_field.unwrap_or(defaults.theme_field),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let query = StockQuery::default();
        assert_eq!(query.database_code, "FSE");
        assert_eq!(query.dataset_code, "AFX_X");
        assert_eq!(query.start_date.to_string(), "2017-01-01");
        assert_eq!(query.end_date.to_string(), "2017-12-31");
        assert!(query.api_key.is_none());
    }

    #[test]
    fn test_query_url() {
        let query = StockQuery::builder().api_key("abc123").build().unwrap();
        assert_eq!(
            query.url(),
            "https://www.quandl.com/api/v3/datasets/FSE/AFX_X.json\
             ?start_date=2017-01-01&end_date=2017-12-31&api_key=abc123"
        );
        assert!(!query.redacted_url().contains("abc123"));
    }

    #[test]
    fn test_query_url_encodes_api_key() {
        let query = StockQuery::builder().api_key("a&b#c+d").build().unwrap();
        assert!(query.url().ends_with("&api_key=a%26b%23c%2Bd"));
    }

    #[test]
    fn test_query_base_url_trailing_slash() {
        let query = StockQuery::builder()
            .base_url("http://localhost:8080/datasets/")
            .build()
            .unwrap();
        assert!(query.url().starts_with("http://localhost:8080/datasets/FSE/AFX_X.json?"));
    }

    #[test]
    fn test_empty_api_key_ignored() {
        let query = StockQuery::builder().api_key("  ").build().unwrap();
        assert!(query.api_key.is_none());
    }

    #[test]
    fn test_validation_invalid_code() {
        let result = StockQuery::builder().dataset_code("afx/x").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCode { .. }
        ));
    }

    #[test]
    fn test_validation_date_range() {
        let result = StockQuery::builder()
            .start_date(NaiveDate::from_ymd_opt(2018, 1, 1).unwrap())
            .end_date(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDateRange { .. }
        ));
    }

    #[test]
    fn test_validation_timeout() {
        let result = StockQuery::builder().timeout_secs(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTimeout(0)
        ));
    }

    #[test]
    fn test_query_serialization_skips_api_key() {
        let query = StockQuery::builder().api_key("secret").build().unwrap();
        let json = serde_json::to_string(&query).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"start_date\":\"2017-01-01\""));
    }

    #[test]
    fn test_projects_defaults() {
        let config = ProjectsConfig::builder().build().unwrap();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.fill_scope, FillScope::WithinCode);
        assert_eq!(config.country_field, "countryshortname");
        assert_eq!(config.theme_field, "mjtheme_namecode");
    }

    #[test]
    fn test_projects_validation() {
        assert!(matches!(
            ProjectsConfig::builder().top_n(0).build().unwrap_err(),
            ConfigValidationError::InvalidTopN(0)
        ));
        assert!(matches!(
            ProjectsConfig::builder().theme_field("").build().unwrap_err(),
            ConfigValidationError::EmptyField(_)
        ));
    }

    #[test]
    fn test_projects_config_from_json() {
        let json = r#"{
            "top_n": 5,
            "fill_scope": "global",
            "country_field": "countryname",
            "theme_field": "mjtheme_namecode"
        }"#;

        let config: ProjectsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.fill_scope, FillScope::Global);
        assert_eq!(config.country_field, "countryname");
    }
}
