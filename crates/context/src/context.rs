//! The context service: the one entry point callers hold on to.
//!
//! A `ContextService` owns the encoder, both corpora and their indices, and
//! the live sources. It is built once (from config or through the builder)
//! and shared by reference. `get_context` always returns text; failures
//! are turned into fixed user-facing messages here and nowhere else.

use crate::aggregator::{AggregatedResults, Aggregator, DEFAULT_LIVE_TIMEOUT};
use crate::corpus::{load_jobs, load_sessions};
use crate::embeddings::Encoder;
use crate::expander::QueryExpander;
use crate::format::build_sections;
use crate::index::{build_or_log, CorpusSearcher};
use crate::records::{JobRecord, SessionRecord};
use crate::sources::{AdzunaJobs, Disabled, EventSource, JobSource, TicketmasterEvents};
use asha_core::{AppConfig, AppError, AppResult};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Returned for a blank query; no source is consulted.
pub const INVALID_QUERY_MESSAGE: &str =
    "Please enter a valid question so I can look up jobs, events, and sessions for you.";

/// Returned when every section came back empty.
pub const NO_RESULTS_MESSAGE: &str = "No relevant results found";

/// Returned when context assembly fails unexpectedly.
pub const ERROR_MESSAGE: &str =
    "I encountered an error while processing your request. Please try again later.";

/// Separator between rendered sections.
const SECTION_SEPARATOR: &str = "\n\n";

fn job_text(job: &JobRecord) -> &str {
    &job.description
}

fn session_text(session: &SessionRecord) -> &str {
    &session.description
}

/// Snapshot of what the service currently has loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ContextStatus {
    /// `provider/model`, or `None` when the encoder is unavailable
    pub encoder: Option<String>,
    pub dimensions: Option<usize>,
    pub jobs_loaded: usize,
    pub jobs_indexed: Option<usize>,
    pub sessions_loaded: usize,
    pub sessions_indexed: Option<usize>,
    pub job_source: String,
    pub event_source: String,
    pub live_timeout_secs: u64,
}

pub struct ContextService {
    aggregator: Aggregator,
    encoder: Encoder,
    jobs: Vec<JobRecord>,
    sessions: Vec<SessionRecord>,
}

impl ContextService {
    pub fn builder() -> ContextServiceBuilder {
        ContextServiceBuilder::default()
    }

    /// Load datasets, start the encoder, build both indices and connect
    /// the live sources described by `config`.
    ///
    /// Nothing here is fatal: a dataset that fails to load is an empty
    /// corpus, an encoder that fails to start leaves both indices absent,
    /// and a live source that cannot be constructed is disabled.
    pub async fn from_config(config: &AppConfig) -> Self {
        let jobs = load_jobs(&config.jobs_path()).unwrap_or_else(|e| {
            tracing::error!("Jobs dataset unavailable: {}", e);
            Vec::new()
        });
        let sessions = load_sessions(&config.sessions_path()).unwrap_or_else(|e| {
            tracing::error!("Sessions dataset unavailable: {}", e);
            Vec::new()
        });

        let encoder = Encoder::init(&config.embedding).await;
        let timeout = Duration::from_secs(config.sources.timeout_secs);

        let job_source: Arc<dyn JobSource> =
            match AdzunaJobs::from_config(&config.sources.adzuna, timeout) {
                Ok(source) => Arc::new(source),
                Err(e) => {
                    tracing::warn!("Live jobs disabled: {}", e);
                    Arc::new(Disabled)
                }
            };
        let event_source: Arc<dyn EventSource> =
            match TicketmasterEvents::from_config(&config.sources.ticketmaster, timeout) {
                Ok(source) => Arc::new(source),
                Err(e) => {
                    tracing::warn!("Live events disabled: {}", e);
                    Arc::new(Disabled)
                }
            };

        Self::builder()
            .encoder(encoder)
            .jobs(jobs)
            .sessions(sessions)
            .job_source(job_source)
            .event_source(event_source)
            .live_timeout(timeout)
            .build()
            .await
    }

    /// Build the grounding context for `query`.
    ///
    /// Always returns displayable text: the joined sections,
    /// [`NO_RESULTS_MESSAGE`], [`INVALID_QUERY_MESSAGE`] or
    /// [`ERROR_MESSAGE`].
    pub async fn get_context(&self, query: &str, location: &str) -> String {
        if query.trim().is_empty() {
            tracing::warn!("Rejected blank query");
            return INVALID_QUERY_MESSAGE.to_string();
        }

        match AssertUnwindSafe(self.assemble(query, location))
            .catch_unwind()
            .await
        {
            Ok(Some(context)) => context,
            Ok(None) => {
                tracing::info!("No results for '{}'", query);
                NO_RESULTS_MESSAGE.to_string()
            }
            Err(panic) => {
                tracing::error!(
                    "Context assembly panicked for '{}': {}",
                    query,
                    panic_message(panic.as_ref())
                );
                ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Raw per-source results for `query`, before dedupe and rendering.
    pub async fn aggregate(&self, query: &str, location: &str) -> AggregatedResults {
        self.aggregator.aggregate(query, location).await
    }

    /// Joined sections, or `None` when every section is empty. Source and
    /// index failures are already absorbed by the aggregator.
    async fn assemble(&self, query: &str, location: &str) -> Option<String> {
        let results = self.aggregator.aggregate(query, location).await;
        let sections = build_sections(results);
        tracing::debug!("Rendered {} sections for '{}'", sections.len(), query);

        if sections.is_empty() {
            return None;
        }
        Some(sections.join(SECTION_SEPARATOR))
    }

    /// Re-encode both held corpora and swap the new indices in.
    ///
    /// Readers holding the previous index keep using it until they finish.
    /// If a corpus fails to index, its current index is left in place and
    /// an error is returned after the other corpus has been processed.
    pub async fn rebuild_indices(&self) -> AppResult<()> {
        if !self.encoder.is_available() {
            return Err(AppError::Embedding("encoder unavailable".to_string()));
        }

        let mut failed = Vec::new();

        if self.jobs.is_empty() {
            self.aggregator.jobs().slot().replace(None);
        } else {
            match build_or_log("jobs", self.jobs.clone(), job_text, &self.encoder).await {
                Some(index) => {
                    self.aggregator.jobs().slot().replace(Some(index));
                }
                None => failed.push("jobs"),
            }
        }

        if self.sessions.is_empty() {
            self.aggregator.sessions().slot().replace(None);
        } else {
            match build_or_log("sessions", self.sessions.clone(), session_text, &self.encoder).await
            {
                Some(index) => {
                    self.aggregator.sessions().slot().replace(Some(index));
                }
                None => failed.push("sessions"),
            }
        }

        if !failed.is_empty() {
            return Err(AppError::Index(format!(
                "Failed to rebuild index: {}",
                failed.join(", ")
            )));
        }

        tracing::info!("Rebuilt indices");
        Ok(())
    }

    pub fn status(&self) -> ContextStatus {
        let jobs_index = self.aggregator.jobs().slot().snapshot();
        let sessions_index = self.aggregator.sessions().slot().snapshot();

        ContextStatus {
            encoder: self
                .encoder
                .describe()
                .map(|(provider, model)| format!("{}/{}", provider, model)),
            dimensions: self.encoder.dimensions(),
            jobs_loaded: self.jobs.len(),
            jobs_indexed: jobs_index.map(|index| index.len()),
            sessions_loaded: self.sessions.len(),
            sessions_indexed: sessions_index.map(|index| index.len()),
            job_source: self.aggregator.job_source().source_name().to_string(),
            event_source: self.aggregator.event_source().source_name().to_string(),
            live_timeout_secs: self.aggregator.live_timeout().as_secs(),
        }
    }

    pub fn expander(&self) -> &QueryExpander {
        self.aggregator.expander()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Assembles a [`ContextService`] from parts.
///
/// Anything left unset is absent: no encoder, empty corpora, disabled
/// live sources, the default synonym table.
#[derive(Default)]
pub struct ContextServiceBuilder {
    encoder: Option<Encoder>,
    jobs: Vec<JobRecord>,
    sessions: Vec<SessionRecord>,
    job_source: Option<Arc<dyn JobSource>>,
    event_source: Option<Arc<dyn EventSource>>,
    expander: Option<QueryExpander>,
    live_timeout: Option<Duration>,
}

impl ContextServiceBuilder {
    pub fn encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn jobs(mut self, jobs: Vec<JobRecord>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn sessions(mut self, sessions: Vec<SessionRecord>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn job_source(mut self, source: Arc<dyn JobSource>) -> Self {
        self.job_source = Some(source);
        self
    }

    pub fn event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.event_source = Some(source);
        self
    }

    pub fn expander(mut self, expander: QueryExpander) -> Self {
        self.expander = Some(expander);
        self
    }

    pub fn live_timeout(mut self, timeout: Duration) -> Self {
        self.live_timeout = Some(timeout);
        self
    }

    /// Build both indices and wire the aggregator.
    pub async fn build(self) -> ContextService {
        let encoder = self.encoder.unwrap_or_else(Encoder::unavailable);

        let jobs_index = if self.jobs.is_empty() {
            None
        } else {
            build_or_log("jobs", self.jobs.clone(), job_text, &encoder).await
        };
        let sessions_index = if self.sessions.is_empty() {
            None
        } else {
            build_or_log("sessions", self.sessions.clone(), session_text, &encoder).await
        };

        let aggregator = Aggregator::new(
            self.expander.unwrap_or_default(),
            Arc::new(CorpusSearcher::new("jobs", jobs_index, encoder.clone())),
            Arc::new(CorpusSearcher::new("sessions", sessions_index, encoder.clone())),
            self.job_source.unwrap_or_else(|| Arc::new(Disabled)),
            self.event_source.unwrap_or_else(|| Arc::new(Disabled)),
        )
        .with_live_timeout(self.live_timeout.unwrap_or(DEFAULT_LIVE_TIMEOUT));

        ContextService {
            aggregator,
            encoder,
            jobs: self.jobs,
            sessions: self.sessions,
        }
    }
}
