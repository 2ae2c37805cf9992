//! Adzuna job search adapter.

use super::{get_json, http_client, JobSource};
use asha_core::config::{resolve_secret, AdzunaConfig};
use asha_core::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// Results requested per call (the first page only).
pub const RESULTS_PER_PAGE: usize = 5;

/// Credentials for the Adzuna API.
#[derive(Debug, Clone)]
pub struct AdzunaCredentials {
    pub app_id: String,
    pub app_key: String,
}

/// Adzuna `/v1/api/jobs/{country}/search/1` client.
#[derive(Debug, Clone)]
pub struct AdzunaJobs {
    client: reqwest::Client,
    endpoint: String,
    country: String,
    credentials: Option<AdzunaCredentials>,
}

impl AdzunaJobs {
    /// Build the adapter, reading credentials from the environment
    /// variables named in `config`.
    ///
    /// Missing credentials are a `Config` error; the caller installs a
    /// disabled source instead.
    pub fn from_config(config: &AdzunaConfig, timeout: Duration) -> AppResult<Self> {
        let (Some(app_id), Some(app_key)) = (
            resolve_secret(&config.app_id_env),
            resolve_secret(&config.app_key_env),
        ) else {
            return Err(AppError::Config(format!(
                "Adzuna credentials missing ({} / {})",
                config.app_id_env, config.app_key_env
            )));
        };

        Ok(Self::new(
            http_client(timeout)?,
            &config.endpoint,
            &config.country,
            Some(AdzunaCredentials { app_id, app_key }),
        ))
    }

    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        country: &str,
        credentials: Option<AdzunaCredentials>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            country: country.to_lowercase(),
            credentials,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/v1/api/jobs/{}/search/1", self.endpoint, self.country)
    }

    fn query_params(
        credentials: &AdzunaCredentials,
        query: &str,
        location: &str,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("app_id", credentials.app_id.clone()),
            ("app_key", credentials.app_key.clone()),
            ("what", query.to_string()),
            ("results_per_page", RESULTS_PER_PAGE.to_string()),
        ];
        if !location.trim().is_empty() {
            params.push(("where", location.trim().to_string()));
        }
        params
    }
}

/// Pull `results[]` out of an Adzuna search response.
pub fn parse_results(body: &Value) -> AppResult<Vec<Value>> {
    match body.get("results") {
        Some(Value::Array(results)) => Ok(results.clone()),
        Some(_) => Err(AppError::Source(
            "Adzuna response field 'results' is not an array".to_string(),
        )),
        None => Ok(Vec::new()),
    }
}

#[async_trait::async_trait]
impl JobSource for AdzunaJobs {
    fn source_name(&self) -> &str {
        "Adzuna"
    }

    async fn fetch_jobs(&self, query: &str, location: &str) -> AppResult<Vec<Value>> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::Source("Adzuna credentials are not configured".to_string()))?;

        let request = self
            .client
            .get(self.search_url())
            .query(&Self::query_params(credentials, query, location));

        let body = get_json("Adzuna", request).await?;
        let results = parse_results(&body)?;

        tracing::debug!("Adzuna returned {} jobs for '{}'", results.len(), query);
        Ok(results)
    }
}
