//! Configuration management for the Asha context builder.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.asha/config.yaml` in the workspace, or `ASHA_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)
//!
//! Secrets (live API credentials) never live in the config file. The file
//! only names the environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Embedding providers understood by the context engine.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .asha/ and data/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Local corpus locations
    pub data: DataConfig,

    /// Embedding encoder settings
    pub embedding: EmbeddingConfig,

    /// Live source settings
    pub sources: SourcesConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Paths of the two local datasets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DataConfig {
    /// CSV file with `title,description,location,company` columns
    pub jobs_path: PathBuf,

    /// JSON array of `{title, description, date}` objects
    pub sessions_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            jobs_path: PathBuf::from("data/job_listing_data.csv"),
            sessions_path: PathBuf::from("data/session_details.json"),
        }
    }
}

/// Embedding encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Number of texts encoded per provider call when indexing a corpus
    pub batch_size: usize,

    /// Provider endpoint (HTTP providers only)
    pub endpoint: Option<String>,

    /// Request timeout in seconds (HTTP providers only)
    pub timeout_secs: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::for_provider("trigram")
    }
}

impl EmbeddingConfig {
    /// Default settings for a named provider.
    pub fn for_provider(provider: &str) -> Self {
        let model = match provider {
            "ollama" => "all-minilm",
            _ => "trigram-v1",
        };

        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions: 384,
            batch_size: 1000,
            endpoint: None,
            timeout_secs: None,
        }
    }
}

/// Live source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcesConfig {
    /// Per-call timeout for live API requests, in seconds
    pub timeout_secs: u64,

    pub adzuna: AdzunaConfig,

    pub ticketmaster: TicketmasterConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            adzuna: AdzunaConfig::default(),
            ticketmaster: TicketmasterConfig::default(),
        }
    }
}

/// Adzuna job search API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AdzunaConfig {
    pub endpoint: String,

    /// Two-letter country segment of the search URL
    pub country: String,

    pub app_id_env: String,

    pub app_key_env: String,
}

impl Default for AdzunaConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.adzuna.com".to_string(),
            country: "gb".to_string(),
            app_id_env: "ADZUNA_APP_ID".to_string(),
            app_key_env: "ADZUNA_APP_KEY".to_string(),
        }
    }
}

/// Ticketmaster Discovery API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketmasterConfig {
    pub endpoint: String,

    pub api_key_env: String,
}

impl Default for TicketmasterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://app.ticketmaster.com".to_string(),
            api_key_env: "TICKETMASTER_API_KEY".to_string(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    data: Option<DataConfig>,
    embedding: Option<EmbeddingConfig>,
    sources: Option<SourcesConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            sources: SourcesConfig::default(),
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `ASHA_WORKSPACE`: Override workspace path
    /// - `ASHA_CONFIG`: Path to config file
    /// - `ASHA_JOBS_PATH`: Jobs CSV dataset
    /// - `ASHA_SESSIONS_PATH`: Sessions JSON dataset
    /// - `ASHA_EMBEDDING_PROVIDER`: Embedding provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_in(None)
    }

    /// Like [`AppConfig::load`], but `workspace` (e.g. from `--workspace`)
    /// takes precedence over `ASHA_WORKSPACE`, so its `.asha/config.yaml`
    /// is the one read.
    pub fn load_in(workspace: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("ASHA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("ASHA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.asha_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(path) = std::env::var("ASHA_JOBS_PATH") {
            config.data.jobs_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("ASHA_SESSIONS_PATH") {
            config.data.sessions_path = PathBuf::from(path);
        }

        if let Ok(provider) = std::env::var("ASHA_EMBEDDING_PROVIDER") {
            config.set_embedding_provider(&provider);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(data) = config_file.data {
            result.data = data;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(sources) = config_file.sources {
            result.sources = sources;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        log_json: bool,
        verbose: bool,
        no_color: bool,
    ) -> AppResult<Self> {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        // ASHA_CONFIG reaches here twice (env layer and clap's env fallback)
        if let Some(config_file) = config_file.filter(|cf| Some(cf) != self.config_file.as_ref()) {
            self = self.merge_yaml(&config_file)?;
            self.config_file = Some(config_file);
        }

        if let Some(provider) = embedding_provider {
            self.set_embedding_provider(&provider);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if log_json {
            self.log_format = LogFormat::Json;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Switch embedding provider, resetting model defaults when it changes.
    fn set_embedding_provider(&mut self, provider: &str) {
        if self.embedding.provider != provider {
            let batch_size = self.embedding.batch_size;
            self.embedding = EmbeddingConfig {
                batch_size,
                ..EmbeddingConfig::for_provider(provider)
            };
        }
    }

    /// Get the path to the .asha directory.
    pub fn asha_dir(&self) -> PathBuf {
        self.workspace.join(".asha")
    }

    /// Jobs dataset path, resolved against the workspace.
    pub fn jobs_path(&self) -> PathBuf {
        self.resolve(&self.data.jobs_path)
    }

    /// Sessions dataset path, resolved against the workspace.
    pub fn sessions_path(&self) -> PathBuf {
        self.resolve(&self.data.sessions_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.sources.timeout_secs == 0 {
            return Err(AppError::Config(
                "Source timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Read a secret from the named environment variable.
///
/// Unset and blank variables both resolve to `None`.
pub fn resolve_secret(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
