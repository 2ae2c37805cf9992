//! Live data sources queried per request.
//!
//! Adapters return the provider's raw result mappings; normalisation into
//! typed records happens in the aggregator. Every failure (missing
//! credentials, network, HTTP status, malformed body) is an
//! `AppError::Source`, which the aggregator turns into an empty
//! contribution for that variation.

pub mod adzuna;
pub mod ticketmaster;

pub use adzuna::AdzunaJobs;
pub use ticketmaster::TicketmasterEvents;

use asha_core::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// Job search provider.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    /// Label attached to normalised jobs (e.g., "Adzuna").
    fn source_name(&self) -> &str;

    /// Fetch raw job mappings for `query`, optionally near `location`.
    async fn fetch_jobs(&self, query: &str, location: &str) -> AppResult<Vec<Value>>;
}

/// Event search provider.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Fetch up to `size` raw event mappings.
    async fn fetch_events(&self, query: &str, location: &str, size: usize)
        -> AppResult<Vec<Value>>;
}

/// Source that is not configured; always returns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disabled;

#[async_trait::async_trait]
impl JobSource for Disabled {
    fn source_name(&self) -> &str {
        "disabled"
    }

    async fn fetch_jobs(&self, _query: &str, _location: &str) -> AppResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

#[async_trait::async_trait]
impl EventSource for Disabled {
    fn source_name(&self) -> &str {
        "disabled"
    }

    async fn fetch_events(
        &self,
        _query: &str,
        _location: &str,
        _size: usize,
    ) -> AppResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

/// HTTP client shared by the live adapters.
pub fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("asha-context/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Source(format!("Failed to create HTTP client: {}", e)))
}

/// Send a GET request and decode the JSON body, mapping every failure to
/// `AppError::Source` tagged with `provider`.
pub(crate) async fn get_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> AppResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Source(format!("{} request failed: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(AppError::Source(format!(
            "{} API error ({}): {}",
            provider, status, snippet
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| AppError::Source(format!("{} returned malformed JSON: {}", provider, e)))
}
