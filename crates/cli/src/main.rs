//! Asha CLI
//!
//! Main entry point for the asha command-line tool.
//! Builds retrieval context for career questions from local corpora and
//! live job and event listings.

mod commands;

use anyhow::Context;
use asha_core::{config::AppConfig, logging};
use clap::{Parser, Subcommand};
use commands::{ContextCommand, ExpandCommand, StatusCommand};
use std::path::PathBuf;

/// Asha - retrieval context for jobs, events and sessions
#[derive(Parser, Debug)]
#[command(name = "asha")]
#[command(about = "Retrieval context for jobs, events and sessions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ASHA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "ASHA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Embedding provider (trigram, ollama)
    #[arg(short, long, global = true, env = "ASHA_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the grounding context for a query
    Context(ContextCommand),

    /// Show the variations a query expands into
    Expand(ExpandCommand),

    /// Show loaded corpora, indices and sources
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // The workspace decides which .asha/config.yaml is read, so it is
    // applied before the file layer rather than as an override
    let config = AppConfig::load_in(cli.workspace).context("Failed to load configuration")?;

    let config = config
        .with_overrides(
            None,
            cli.config,
            cli.embedding_provider,
            cli.log_level,
            cli.log_json,
            cli.verbose,
            cli.no_color,
        )
        .context("Failed to apply command-line overrides")?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)
        .context("Failed to initialize logging")?;

    tracing::info!("Asha CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Embedding provider: {}", config.embedding.provider);

    config.validate().context("Invalid configuration")?;

    let command_name = match &cli.command {
        Commands::Context(_) => "context",
        Commands::Expand(_) => "expand",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Context(cmd) => cmd.execute(&config).await,
        Commands::Expand(cmd) => cmd.execute(),
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.map_err(anyhow::Error::from)
}
