//! Tests for context assembly from query to rendered sections.

use crate::context::{ContextService, ERROR_MESSAGE, INVALID_QUERY_MESSAGE, NO_RESULTS_MESSAGE};
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::Encoder;
use crate::records::{JobRecord, SessionRecord};
use crate::sources::{EventSource, JobSource};
use asha_core::config::AppConfig;
use asha_core::{AppError, AppResult};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Job source returning a fixed payload and counting calls.
    struct StubJobs {
        calls: AtomicUsize,
        payload: Vec<Value>,
    }

    impl StubJobs {
        fn new(payload: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payload,
            })
        }
    }

    #[async_trait::async_trait]
    impl JobSource for StubJobs {
        fn source_name(&self) -> &str {
            "stub-jobs"
        }

        async fn fetch_jobs(&self, _query: &str, _location: &str) -> AppResult<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    struct StubEvents {
        calls: AtomicUsize,
        payload: AppResult<Vec<Value>>,
    }

    impl StubEvents {
        fn new(payload: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payload: Ok(payload),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payload: Err(AppError::Source("events API down".to_string())),
            })
        }
    }

    #[async_trait::async_trait]
    impl EventSource for StubEvents {
        fn source_name(&self) -> &str {
            "stub-events"
        }

        async fn fetch_events(
            &self,
            _query: &str,
            _location: &str,
            size: usize,
        ) -> AppResult<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.payload {
                Ok(events) => Ok(events.iter().take(size).cloned().collect()),
                Err(e) => Err(AppError::Source(e.to_string())),
            }
        }
    }

    /// Job source that panics on every fetch.
    struct PanickingJobs;

    #[async_trait::async_trait]
    impl JobSource for PanickingJobs {
        fn source_name(&self) -> &str {
            "panicking"
        }

        async fn fetch_jobs(&self, _query: &str, _location: &str) -> AppResult<Vec<Value>> {
            panic!("job source exploded");
        }
    }

    /// Job source whose name lookup panics, outside any per-call isolation.
    struct BrokenJobs;

    #[async_trait::async_trait]
    impl JobSource for BrokenJobs {
        fn source_name(&self) -> &str {
            panic!("misconfigured source");
        }

        async fn fetch_jobs(&self, _query: &str, _location: &str) -> AppResult<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn encoder() -> Encoder {
        Encoder::new(Arc::new(TrigramProvider::new(256)), 4)
    }

    fn local_jobs() -> Vec<JobRecord> {
        vec![
            JobRecord {
                title: "Data Analyst".to_string(),
                description: "Analyse data with SQL and build reporting dashboards".to_string(),
                location: "Pune".to_string(),
                company: "Acme Analytics".to_string(),
            },
            JobRecord {
                title: "Pastry Chef".to_string(),
                description: "Bake bread and pastries in a busy hotel kitchen".to_string(),
                location: "Mumbai".to_string(),
                company: "Grand Hotel".to_string(),
            },
        ]
    }

    fn local_sessions() -> Vec<SessionRecord> {
        vec![SessionRecord {
            title: "Resume Clinic".to_string(),
            description: "Get feedback on your data analyst resume".to_string(),
            date: "2026-11-05".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_bank_jobs_live_only() {
        let jobs = StubJobs::new(vec![json!({
            "title": "Bank Teller",
            "redirect_url": "https://jobs.example/teller"
        })]);

        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(jobs.clone())
            .build()
            .await;

        let context = service.get_context("bank jobs", "").await;
        assert_eq!(
            context,
            "### 🚀 Live Job Listings\n\
             • **Bank Teller** at Unknown Company (Remote)\n  \n  \
             [Apply Here](https://jobs.example/teller)"
        );
        assert_eq!(jobs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_query_touches_no_source() {
        let jobs = StubJobs::new(vec![json!({"title": "Anything", "url": "https://x.example"})]);
        let events = StubEvents::new(Vec::new());

        let service = ContextService::builder()
            .encoder(encoder())
            .jobs(local_jobs())
            .job_source(jobs.clone())
            .event_source(events.clone())
            .build()
            .await;

        assert_eq!(service.get_context("", "").await, INVALID_QUERY_MESSAGE);
        assert_eq!(service.get_context("  \t ", "Pune").await, INVALID_QUERY_MESSAGE);
        assert_eq!(jobs.calls.load(Ordering::SeqCst), 0);
        assert_eq!(events.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_events_keep_jobs_section() {
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(StubJobs::new(vec![json!({
                "title": "Analyst",
                "redirect_url": "https://jobs.example/analyst"
            })]))
            .event_source(StubEvents::failing())
            .build()
            .await;

        let context = service.get_context("analyst", "").await;
        assert!(context.starts_with("### 🚀 Live Job Listings"));
        assert!(!context.contains("Upcoming Events"));
    }

    #[tokio::test]
    async fn test_panicking_source_is_isolated() {
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(Arc::new(PanickingJobs))
            .event_source(StubEvents::new(vec![json!({
                "name": "Career Fair",
                "url": "https://events.example/fair"
            })]))
            .build()
            .await;

        let context = service.get_context("career fair", "").await;
        assert!(context.starts_with("### 📅 Upcoming Events"));
        assert!(context.contains("• **Career Fair**\n  Venue not specified (Date not available)"));
    }

    #[tokio::test]
    async fn test_unexpected_panic_becomes_error_message() {
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(Arc::new(BrokenJobs))
            .build()
            .await;

        assert_eq!(service.get_context("analyst", "").await, ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_sections_in_fixed_order() {
        let service = ContextService::builder()
            .encoder(encoder())
            .jobs(local_jobs())
            .sessions(local_sessions())
            .job_source(StubJobs::new(vec![json!({
                "title": "Remote Analyst",
                "company": {"display_name": "Globex"},
                "redirect_url": "https://jobs.example/remote"
            })]))
            .event_source(StubEvents::new(vec![json!({
                "name": "Data Meetup",
                "dates": {"start": {"localDate": "2026-11-20"}},
                "url": "https://events.example/meetup"
            })]))
            .build()
            .await;

        let context = service.get_context("data analyst", "").await;
        let sections: Vec<&str> = context.split("\n\n").collect();
        assert_eq!(sections.len(), 4);
        assert!(sections[0].starts_with("### 🌟 Local Job Opportunities"));
        assert!(sections[1].starts_with("### 🚀 Live Job Listings"));
        assert!(sections[2].starts_with("### 📅 Upcoming Events"));
        assert!(sections[3].starts_with("### 🎓 Local Sessions"));

        // Nearest local job comes first
        assert!(sections[0].contains("• **Data Analyst** (Pune)\n  Acme Analytics"));
        assert!(sections[2].contains("(2026-11-20)"));
    }

    #[tokio::test]
    async fn test_duplicates_across_variations_collapse() {
        // "tech jobs" expands to five variations; the stub answers each one
        let jobs = StubJobs::new(vec![json!({
            "title": "Platform Engineer",
            "redirect_url": "https://jobs.example/platform"
        })]);
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(jobs.clone())
            .build()
            .await;

        let context = service.get_context("tech jobs", "").await;
        assert_eq!(jobs.calls.load(Ordering::SeqCst), 5);
        assert_eq!(context.matches("Platform Engineer").count(), 1);
    }

    #[tokio::test]
    async fn test_live_jobs_capped_at_three() {
        let payload = (1..=5)
            .map(|i| json!({"title": format!("Role {}", i), "url": format!("https://jobs.example/{}", i)}))
            .collect();
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(StubJobs::new(payload))
            .build()
            .await;

        let context = service.get_context("roles", "").await;
        assert_eq!(context.matches("[Apply Here]").count(), 3);
        assert!(context.contains("Role 1"));
        assert!(!context.contains("Role 4"));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let service = ContextService::builder()
            .encoder(encoder())
            .job_source(StubJobs::new(vec![json!({"title": "No Link Job"})]))
            .build()
            .await;

        assert_eq!(service.get_context("anything", "").await, NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_unavailable_encoder_still_serves_live_results() {
        let service = ContextService::builder()
            .encoder(Encoder::unavailable())
            .jobs(local_jobs())
            .sessions(local_sessions())
            .job_source(StubJobs::new(vec![json!({
                "title": "Analyst",
                "url": "https://jobs.example/a"
            })]))
            .build()
            .await;

        let context = service.get_context("data analyst", "").await;
        assert!(context.starts_with("### 🚀 Live Job Listings"));
        assert!(!context.contains("Local Job Opportunities"));
        assert!(!context.contains("Local Sessions"));
    }

    #[tokio::test]
    async fn test_from_config_loads_datasets() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("data")).unwrap();
        std::fs::write(
            temp.path().join("data/job_listing_data.csv"),
            "title,description,location,company\n\
             Data Analyst,SQL dashboards,Pune,Acme\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("data/session_details.json"),
            r#"[{"title": "Resume Clinic", "description": "CV review", "date": "2026-11-05"}]"#,
        )
        .unwrap();

        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };
        config.embedding.dimensions = 64;
        config.sources.adzuna.app_id_env = "ASHA_TEST_UNSET_ADZUNA_ID".to_string();
        config.sources.adzuna.app_key_env = "ASHA_TEST_UNSET_ADZUNA_KEY".to_string();
        config.sources.ticketmaster.api_key_env = "ASHA_TEST_UNSET_TM_KEY".to_string();

        let service = ContextService::from_config(&config).await;
        let status = service.status();
        assert_eq!(status.jobs_indexed, Some(1));
        assert_eq!(status.sessions_indexed, Some(1));
        // Without credentials the live sources are never installed
        assert_eq!(status.job_source, "disabled");
        assert_eq!(status.event_source, "disabled");

        let context = service.get_context("data analyst", "").await;
        assert!(context.starts_with("### 🌟 Local Job Opportunities"));
        assert!(context.contains("### 🎓 Local Sessions"));
        assert!(!context.contains("Live Job Listings"));
    }

    #[tokio::test]
    async fn test_from_config_missing_datasets_degrade() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };
        config.embedding.dimensions = 64;
        config.sources.adzuna.app_id_env = "ASHA_TEST_UNSET_ADZUNA_ID".to_string();
        config.sources.adzuna.app_key_env = "ASHA_TEST_UNSET_ADZUNA_KEY".to_string();
        config.sources.ticketmaster.api_key_env = "ASHA_TEST_UNSET_TM_KEY".to_string();

        let service = ContextService::from_config(&config).await;
        let status = service.status();
        assert_eq!(status.jobs_loaded, 0);
        assert_eq!(status.jobs_indexed, None);
        assert_eq!(service.get_context("data analyst", "").await, NO_RESULTS_MESSAGE);
    }
}
