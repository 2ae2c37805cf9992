//! Embedding encoder shared by index construction and query-time search.
//!
//! The [`Encoder`] either wraps a live provider or is *unavailable*. An
//! unavailable encoder never panics or blocks; every caller checks
//! [`Encoder::is_available`] (or handles the error from [`Encoder::encode`])
//! and degrades to empty results.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use asha_core::config::EmbeddingConfig;
use asha_core::{AppError, AppResult};
use std::sync::Arc;

/// Default number of texts sent to the provider per call.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Batched, dimension-checked front end over an [`EmbeddingProvider`].
#[derive(Debug, Clone)]
pub struct Encoder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    batch_size: usize,
}

impl Encoder {
    /// Wrap an existing provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider: Some(provider),
            batch_size: batch_size.max(1),
        }
    }

    /// An encoder with no provider; every encode call fails fast.
    pub fn unavailable() -> Self {
        Self {
            provider: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Build the encoder described by `config`.
    ///
    /// Provider failures (unknown name, unreachable server, wrong model) are
    /// logged and yield an unavailable encoder instead of an error.
    pub async fn init(config: &EmbeddingConfig) -> Self {
        match create_provider(config).await {
            Ok(provider) => {
                tracing::info!(
                    "Initialized embedding provider '{}' (model: {}, dimensions: {})",
                    provider.provider_name(),
                    provider.model_name(),
                    provider.dimensions()
                );
                Self::new(provider, config.batch_size)
            }
            Err(e) => {
                tracing::error!("Embedding encoder unavailable: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Output dimension, if available.
    pub fn dimensions(&self) -> Option<usize> {
        self.provider.as_ref().map(|p| p.dimensions())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Provider and model names, if available.
    pub fn describe(&self) -> Option<(String, String)> {
        self.provider
            .as_ref()
            .map(|p| (p.provider_name().to_string(), p.model_name().to_string()))
    }

    /// Encode texts, `batch_size` at a time, preserving input order.
    ///
    /// Fails if the encoder is unavailable, the provider errors, or any
    /// vector has the wrong dimension or a NaN/infinite component.
    pub async fn encode(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AppError::Embedding("Encoder unavailable".to_string()))?;

        let dimensions = provider.dimensions();
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let embedded = provider.embed_batch(batch).await?;

            if embedded.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Provider returned {} vectors for a batch of {}",
                    embedded.len(),
                    batch.len()
                )));
            }

            if let Some(bad) = embedded.iter().find(|v| v.len() != dimensions) {
                return Err(AppError::Embedding(format!(
                    "Dimension mismatch: expected {}, got {}",
                    dimensions,
                    bad.len()
                )));
            }

            if embedded.iter().flatten().any(|x| !x.is_finite()) {
                return Err(AppError::Embedding(format!(
                    "Provider returned a non-finite value in batch {}",
                    batch_no
                )));
            }

            tracing::trace!("Encoded batch {} ({} texts)", batch_no, batch.len());
            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    /// Encode a single text.
    pub async fn encode_one(&self, text: &str) -> AppResult<Vec<f32>> {
        self.encode(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts provider calls and can return vectors of the wrong size.
    #[derive(Debug)]
    struct CountingProvider {
        calls: AtomicUsize,
        dimensions: usize,
        emitted: usize,
        value: f32,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            "counting-v1"
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![self.value; self.emitted]).collect())
        }
    }

    #[tokio::test]
    async fn test_encode_batches() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 4,
            emitted: 4,
            value: 0.5,
        });
        let encoder = Encoder::new(provider.clone(), 2);

        let texts: Vec<String> = (0..5).map(|i| format!("text {}", i)).collect();
        let vectors = encoder.encode(&texts).await.unwrap();

        assert_eq!(vectors.len(), 5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_fast() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 4,
            emitted: 3,
            value: 0.5,
        });
        let encoder = Encoder::new(provider, 10);

        let result = encoder.encode(&["a".to_string()]).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }

    #[tokio::test]
    async fn test_non_finite_vectors_rejected() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 2,
            emitted: 2,
            value: f32::INFINITY,
        });
        let encoder = Encoder::new(provider, 10);

        let err = encoder.encode(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("non-finite"));
    }

    #[tokio::test]
    async fn test_unavailable_encoder() {
        let encoder = Encoder::unavailable();
        assert!(!encoder.is_available());
        assert_eq!(encoder.dimensions(), None);
        assert!(encoder.encode_one("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_init_unknown_provider_is_unavailable() {
        let config = EmbeddingConfig {
            provider: "nope".to_string(),
            ..EmbeddingConfig::default()
        };
        let encoder = Encoder::init(&config).await;
        assert!(!encoder.is_available());
    }

    #[tokio::test]
    async fn test_init_trigram() {
        let encoder = Encoder::init(&EmbeddingConfig::default()).await;
        assert!(encoder.is_available());
        assert_eq!(encoder.batch_size(), 1000);
        assert_eq!(
            encoder.describe(),
            Some(("trigram".to_string(), "trigram-v1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_encode_one_matches_provider() {
        let provider = Arc::new(TrigramProvider::new(32));
        let encoder = Encoder::new(provider.clone(), 8);
        let direct = provider.embed("mentor").await.unwrap();
        assert_eq!(encoder.encode_one("mentor").await.unwrap(), direct);
    }
}
