// Service exports
pub mod cache;
pub mod catalog;
pub mod directions;
pub mod geocoding;
pub mod summary;

use std::time::Duration;
use thiserror::Error;

pub use cache::{CacheStats, TtlCache, CATALOG_TTL, COORDINATE_TTL, ROUTE_TTL};
pub use catalog::{AirtableCatalog, CatalogSource};
pub use directions::{DirectionsProvider, MapboxDirections};
pub use geocoding::{GeocodingProvider, MapboxGeocoder, NominatimGeocoder};
pub use summary::{GeminiSummarizer, SummaryGenerator, FALLBACK_SUMMARY};

/// Errors raised by external providers
///
/// "Nothing matched" is never an error; providers return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Build the shared HTTP client used by provider adapters
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Run a provider call under a deadline
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ProviderError>
where
    F: std::future::Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ProviderError::Timeout(timeout))?
}
