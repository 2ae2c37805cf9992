//! Status command handler.
//!
//! Loads the service the same way `context` does and reports what came up.

use asha_context::ContextService;
use asha_core::{config::AppConfig, AppResult};
use clap::Args;

/// Show loaded corpora, indices and sources
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn indexed(count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} indexed", n),
        None => "index unavailable".to_string(),
    }
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let service = ContextService::from_config(config).await;
        let status = service.status();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }

        println!("Workspace: {}", config.workspace.display());
        match (&status.encoder, status.dimensions) {
            (Some(encoder), Some(dims)) => println!("Encoder:   {} ({} dims)", encoder, dims),
            _ => println!("Encoder:   unavailable"),
        }
        println!(
            "Jobs:      {} loaded from {}, {}",
            status.jobs_loaded,
            config.jobs_path().display(),
            indexed(status.jobs_indexed)
        );
        println!(
            "Sessions:  {} loaded from {}, {}",
            status.sessions_loaded,
            config.sessions_path().display(),
            indexed(status.sessions_indexed)
        );
        println!(
            "Live:      {} jobs, {} events ({}s timeout)",
            status.job_source, status.event_source, status.live_timeout_secs
        );

        Ok(())
    }
}
