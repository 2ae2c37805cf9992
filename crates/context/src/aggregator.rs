//! Fan-out of every query variation to the four sources.
//!
//! One call per variation per source, all in flight at once and joined
//! before anything downstream looks at the results. A call that errors,
//! panics or (for live sources) exceeds its timeout contributes nothing.

use crate::expander::QueryExpander;
use crate::index::CorpusSearcher;
use crate::records::{JobRecord, LiveEvent, LiveJob, SessionRecord};
use crate::sources::{EventSource, JobSource};
use asha_core::AppResult;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Nearest neighbours requested from each local index per variation.
pub const LOCAL_K: usize = 2;

/// Raw live jobs kept per variation.
pub const MAX_LIVE_JOBS: usize = 5;

/// Live events requested (and kept) per variation.
pub const LIVE_EVENT_SIZE: usize = 3;

/// Default bound on a single live-source call.
pub const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-source results, concatenated across variations in variation order.
/// Not yet deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResults {
    pub local_jobs: Vec<JobRecord>,
    pub live_jobs: Vec<LiveJob>,
    pub live_events: Vec<LiveEvent>,
    pub sessions: Vec<SessionRecord>,
}

impl AggregatedResults {
    pub fn is_empty(&self) -> bool {
        self.local_jobs.is_empty()
            && self.live_jobs.is_empty()
            && self.live_events.is_empty()
            && self.sessions.is_empty()
    }
}

pub struct Aggregator {
    expander: QueryExpander,
    jobs: Arc<CorpusSearcher<JobRecord>>,
    sessions: Arc<CorpusSearcher<SessionRecord>>,
    job_source: Arc<dyn JobSource>,
    event_source: Arc<dyn EventSource>,
    live_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        expander: QueryExpander,
        jobs: Arc<CorpusSearcher<JobRecord>>,
        sessions: Arc<CorpusSearcher<SessionRecord>>,
        job_source: Arc<dyn JobSource>,
        event_source: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            expander,
            jobs,
            sessions,
            job_source,
            event_source,
            live_timeout: DEFAULT_LIVE_TIMEOUT,
        }
    }

    pub fn with_live_timeout(mut self, timeout: Duration) -> Self {
        self.live_timeout = timeout;
        self
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    pub fn jobs(&self) -> &CorpusSearcher<JobRecord> {
        &self.jobs
    }

    pub fn sessions(&self) -> &CorpusSearcher<SessionRecord> {
        &self.sessions
    }

    pub fn job_source(&self) -> &dyn JobSource {
        self.job_source.as_ref()
    }

    pub fn event_source(&self) -> &dyn EventSource {
        self.event_source.as_ref()
    }

    pub fn live_timeout(&self) -> Duration {
        self.live_timeout
    }

    /// Query all four sources for every variation of `query`.
    ///
    /// Never fails: a blank query expands to nothing and yields empty
    /// results without calling any source.
    pub async fn aggregate(&self, query: &str, location: &str) -> AggregatedResults {
        let variations = self.expander.expand(query);
        if variations.is_empty() {
            return AggregatedResults::default();
        }
        tracing::info!("Expanded query into {} variations: {:?}", variations.len(), variations);

        let timeout = Some(self.live_timeout);
        let local_jobs = variations
            .iter()
            .map(|v| isolated("jobs index", v, None, self.jobs.search(v, LOCAL_K)));
        let live_jobs = variations.iter().map(|v| {
            isolated(self.job_source.source_name(), v, timeout, self.live_jobs(v, location))
        });
        let live_events = variations.iter().map(|v| {
            isolated(self.event_source.source_name(), v, timeout, self.live_events(v, location))
        });
        let sessions = variations
            .iter()
            .map(|v| isolated("sessions index", v, None, self.sessions.search(v, LOCAL_K)));

        let (local_jobs, live_jobs, live_events, sessions) = futures::join!(
            join_all(local_jobs),
            join_all(live_jobs),
            join_all(live_events),
            join_all(sessions)
        );

        let results = AggregatedResults {
            local_jobs: local_jobs.into_iter().flatten().collect(),
            live_jobs: live_jobs.into_iter().flatten().collect(),
            live_events: live_events.into_iter().flatten().collect(),
            sessions: sessions.into_iter().flatten().collect(),
        };

        tracing::debug!(
            "Aggregated {} local jobs, {} live jobs, {} live events, {} sessions",
            results.local_jobs.len(),
            results.live_jobs.len(),
            results.live_events.len(),
            results.sessions.len()
        );
        results
    }

    async fn live_jobs(&self, variation: &str, location: &str) -> AppResult<Vec<LiveJob>> {
        let raw = self.job_source.fetch_jobs(variation, location).await?;
        let source = self.job_source.source_name();

        Ok(normalise(raw, MAX_LIVE_JOBS, source, |r| LiveJob::from_raw(r, source)))
    }

    async fn live_events(&self, variation: &str, location: &str) -> AppResult<Vec<LiveEvent>> {
        let raw = self
            .event_source
            .fetch_events(variation, location, LIVE_EVENT_SIZE)
            .await?;

        Ok(normalise(
            raw,
            LIVE_EVENT_SIZE,
            self.event_source.source_name(),
            LiveEvent::from_raw,
        ))
    }
}

/// Keep the first `cap` raw entries and convert them, skipping non-objects.
fn normalise<T, F>(raw: Vec<serde_json::Value>, cap: usize, source: &str, convert: F) -> Vec<T>
where
    F: Fn(&serde_json::Value) -> Option<T>,
{
    let kept = raw.len().min(cap);
    let records: Vec<T> = raw.iter().take(cap).filter_map(convert).collect();
    if records.len() < kept {
        tracing::warn!(
            "{}: skipped {} malformed result entries",
            source,
            kept - records.len()
        );
    }
    records
}

/// Run one source call, turning errors, panics and timeouts into an empty
/// contribution.
async fn isolated<T, F>(source: &str, variation: &str, timeout: Option<Duration>, call: F) -> Vec<T>
where
    F: Future<Output = AppResult<Vec<T>>>,
{
    let guarded = AssertUnwindSafe(call).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!("{} timed out after {:?} for '{}'", source, limit, variation);
                return Vec::new();
            }
        },
        None => guarded.await,
    };

    match outcome {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            tracing::warn!("{} failed for '{}': {}", source, variation, e);
            Vec::new()
        }
        Err(_) => {
            tracing::warn!("{} panicked for '{}'", source, variation);
            Vec::new()
        }
    }
}
