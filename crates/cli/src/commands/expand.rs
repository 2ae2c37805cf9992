//! Expand command handler.

use asha_context::QueryExpander;
use asha_core::AppResult;
use clap::Args;

/// Show the variations a query expands into
#[derive(Args, Debug)]
pub struct ExpandCommand {
    /// The query to expand
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExpandCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing expand command");

        let variations = QueryExpander::default().expand(&self.query);
        tracing::debug!("{} variations", variations.len());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&variations)?);
            return Ok(());
        }

        if variations.is_empty() {
            println!("No variations (blank query)");
        }
        for variation in &variations {
            println!("{}", variation);
        }

        Ok(())
    }
}
