//! Context command handler.
//!
//! Builds the grounding context for one query and prints it.

use asha_context::{detect_ambiguity, detect_bias, extract_location, ContextService};
use asha_core::{config::AppConfig, AppResult};
use clap::Args;

/// Build the grounding context for a query
#[derive(Args, Debug)]
pub struct ContextCommand {
    /// The question to build context for
    pub query: String,

    /// Location for live searches (default: taken from the query)
    #[arg(short, long)]
    pub location: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not stop for clarification on ambiguous terms
    #[arg(long)]
    pub skip_ambiguity_check: bool,
}

impl ContextCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing context command");
        tracing::debug!("Context command options: {:?}", self);

        if !self.skip_ambiguity_check {
            if let Some(clarification) = detect_ambiguity(&self.query) {
                tracing::info!("Query is ambiguous; asking for clarification");
                if self.json {
                    let output = serde_json::json!({
                        "query": self.query,
                        "clarification": clarification,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("{}", clarification);
                }
                return Ok(());
            }
        }

        if let Some((bias, reply)) = detect_bias(&self.query) {
            tracing::info!("Query matched {} bias phrasing; not retrieving", bias.as_str());
            if self.json {
                let output = serde_json::json!({
                    "query": self.query,
                    "bias_type": bias.as_str(),
                    "response": reply,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", reply);
            }
            return Ok(());
        }

        let location = self
            .location
            .clone()
            .or_else(|| extract_location(&self.query))
            .unwrap_or_default();
        if !location.is_empty() {
            tracing::debug!("Using location: {}", location);
        }

        let service = ContextService::from_config(config).await;
        let context = service.get_context(&self.query, &location).await;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "location": location,
                "context": context,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", context);
        }

        Ok(())
    }
}
