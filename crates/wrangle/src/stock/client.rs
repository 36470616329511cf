//! Blocking HTTP client for the datasets API.

use super::StockDataset;
use super::dataset::ErrorEnvelope;
use crate::config::StockQuery;
use crate::error::{AnalysisError, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches one dataset per [`StockQuery`].
///
/// A single GET is issued per call; failures are returned to the caller
/// without retrying.
///
/// # Example
///
/// ```rust,ignore
/// use wrangle::{StockClient, StockQuery, StockSummary};
///
/// let query = StockQuery::builder().api_key("your-api-key").build()?;
/// let dataset = StockClient::new(query)?.fetch()?;
/// let summary = StockSummary::from_dataset(&dataset)?;
/// ```
pub struct StockClient {
    query: StockQuery,
    client: Client,
}

static_assertions::assert_impl_all!(StockClient: Send, Sync);

impl StockClient {
    /// Create a client for the given query.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(query: StockQuery) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(query.timeout_secs))
            .build()?;

        Ok(Self { query, client })
    }

    /// The query this client was built for.
    pub fn query(&self) -> &StockQuery {
        &self.query
    }

    /// Request the dataset and parse the response.
    pub fn fetch(&self) -> Result<StockDataset> {
        info!("Requesting {}", self.query.redacted_url());

        let response = self
            .client
            .get(self.query.url())
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!("Received {} bytes with status {}", body.len(), status);

        if !status.is_success() {
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        StockDataset::from_json_str(&body)
    }
}

/// Pull a readable message out of an error body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.quandl_error.to_string(),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.chars().take(200).collect(),
    }
}
