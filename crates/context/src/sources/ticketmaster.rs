//! Ticketmaster Discovery API events adapter.

use super::{get_json, http_client, EventSource};
use asha_core::config::{resolve_secret, TicketmasterConfig};
use asha_core::{AppError, AppResult};
use serde_json::Value;
use std::time::Duration;

/// `/discovery/v2/events.json` client.
#[derive(Debug, Clone)]
pub struct TicketmasterEvents {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl TicketmasterEvents {
    /// Missing API key is a `Config` error; the caller installs a
    /// disabled source instead.
    pub fn from_config(config: &TicketmasterConfig, timeout: Duration) -> AppResult<Self> {
        let Some(api_key) = resolve_secret(&config.api_key_env) else {
            return Err(AppError::Config(format!(
                "Ticketmaster API key missing ({})",
                config.api_key_env
            )));
        };

        Ok(Self::new(
            http_client(timeout)?,
            &config.endpoint,
            Some(api_key),
        ))
    }

    pub fn new(client: reqwest::Client, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn events_url(&self) -> String {
        format!("{}/discovery/v2/events.json", self.endpoint)
    }

    fn query_params(
        api_key: &str,
        query: &str,
        city: &str,
        size: usize,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apikey", api_key.to_string()),
            ("keyword", query.to_string()),
            ("size", size.to_string()),
            ("sort", "date,asc".to_string()),
        ];
        if !city.trim().is_empty() {
            params.push(("city", city.trim().to_string()));
        }
        params
    }
}

/// Pull `_embedded.events[]` out of a Discovery response.
///
/// A response without `_embedded` means no matches.
pub fn parse_events(body: &Value) -> AppResult<Vec<Value>> {
    match body.get("_embedded").and_then(|e| e.get("events")) {
        Some(Value::Array(events)) => Ok(events.clone()),
        Some(_) => Err(AppError::Source(
            "Ticketmaster response field '_embedded.events' is not an array".to_string(),
        )),
        None => Ok(Vec::new()),
    }
}

#[async_trait::async_trait]
impl EventSource for TicketmasterEvents {
    fn source_name(&self) -> &str {
        "Ticketmaster"
    }

    async fn fetch_events(
        &self,
        query: &str,
        location: &str,
        size: usize,
    ) -> AppResult<Vec<Value>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Source("Ticketmaster API key is not configured".to_string())
        })?;

        let request = self
            .client
            .get(self.events_url())
            .query(&Self::query_params(api_key, query, location, size));

        let body = get_json("Ticketmaster", request).await?;
        let mut events = parse_events(&body)?;
        events.truncate(size);

        tracing::debug!("Ticketmaster returned {} events for '{}'", events.len(), query);
        Ok(events)
    }
}
