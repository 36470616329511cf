//! Daily stock-exchange records: fetching, parsing and summarizing.

#[cfg(feature = "fetch")]
mod client;
mod dataset;
mod summary;

#[cfg(feature = "fetch")]
pub use client::StockClient;
pub use dataset::StockDataset;
pub use summary::StockSummary;
