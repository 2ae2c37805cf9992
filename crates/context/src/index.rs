//! In-memory nearest-neighbour indices over the local corpora.
//!
//! A [`VectorIndex`] owns its records and their vectors as parallel arrays;
//! position `i` in one always refers to position `i` in the other. Indices
//! are never mutated after [`VectorIndex::build`]. To refresh, build a new
//! one and [`IndexSlot::replace`] it in.

use crate::embeddings::Encoder;
use asha_core::{AppError, AppResult};
use std::sync::{Arc, RwLock};

/// Exact L2 (brute force) index.
#[derive(Debug)]
pub struct VectorIndex<R> {
    records: Vec<R>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl<R> VectorIndex<R> {
    /// Encode one text per record and build the index.
    ///
    /// `extract` picks the indexed field; callers return `""` for missing
    /// values. Fails on an empty record set, an unavailable encoder, or
    /// vectors that disagree on dimension.
    pub async fn build<F>(records: Vec<R>, extract: F, encoder: &Encoder) -> AppResult<Self>
    where
        F: Fn(&R) -> &str,
    {
        if records.is_empty() {
            return Err(AppError::Index("Cannot build an index from no records".to_string()));
        }

        let texts: Vec<String> = records.iter().map(|r| extract(r).to_string()).collect();
        let vectors = encoder.encode(&texts).await?;

        Self::from_parts(records, vectors)
    }

    /// Pair pre-computed vectors with their records. Every vector must have
    /// the same non-zero length and contain only finite values.
    pub fn from_parts(records: Vec<R>, vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        if records.len() != vectors.len() {
            return Err(AppError::Index(format!(
                "Record/vector count mismatch: {} records, {} vectors",
                records.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if dimensions == 0 {
            return Err(AppError::Index("Vectors must be non-empty".to_string()));
        }

        if let Some(pos) = vectors.iter().position(|v| v.len() != dimensions) {
            return Err(AppError::Index(format!(
                "Dimension mismatch at record {}: expected {}, got {}",
                pos,
                dimensions,
                vectors[pos].len()
            )));
        }

        if let Some(pos) = vectors.iter().position(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(AppError::Index(format!(
                "Non-finite value in vector for record {}",
                pos
            )));
        }

        Ok(Self {
            records,
            vectors,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Up to `k` records nearest to `query`, nearest first, with their
    /// squared L2 distance. Equal distances keep build order.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(&R, f32)>> {
        if query.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "Dimension mismatch: index has {}, query has {}",
                self.dimensions,
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        // sort_by is stable, which gives the tie-break on build order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| (&self.records[i], distance))
            .collect())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Holder for an index that may be absent and may be swapped.
///
/// Readers take a cheap `Arc` snapshot and drop the lock immediately, so
/// no lock is ever held across an await.
#[derive(Debug)]
pub struct IndexSlot<R> {
    inner: RwLock<Option<Arc<VectorIndex<R>>>>,
}

impl<R> Default for IndexSlot<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> IndexSlot<R> {
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub fn new(index: Option<VectorIndex<R>>) -> Self {
        Self {
            inner: RwLock::new(index.map(Arc::new)),
        }
    }

    /// Current index, if one is installed.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex<R>>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Atomically install a new index (or clear it), returning the old one.
    pub fn replace(&self, index: Option<VectorIndex<R>>) -> Option<Arc<VectorIndex<R>>> {
        let next = index.map(Arc::new);
        match self.inner.write() {
            Ok(mut guard) => std::mem::replace(&mut *guard, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        }
    }

    pub fn is_available(&self) -> bool {
        self.snapshot().is_some()
    }
}

/// Text search over one corpus: encoder plus index slot.
#[derive(Debug)]
pub struct CorpusSearcher<R> {
    name: &'static str,
    slot: IndexSlot<R>,
    encoder: Encoder,
}

impl<R: Clone> CorpusSearcher<R> {
    pub fn new(name: &'static str, index: Option<VectorIndex<R>>, encoder: Encoder) -> Self {
        Self {
            name,
            slot: IndexSlot::new(index),
            encoder,
        }
    }

    /// Build the index for `records`, degrading to an absent index on any
    /// failure.
    pub async fn build<F>(name: &'static str, records: Vec<R>, extract: F, encoder: Encoder) -> Self
    where
        F: Fn(&R) -> &str,
    {
        let index = build_or_log(name, records, extract, &encoder).await;
        Self::new(name, index, encoder)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn slot(&self) -> &IndexSlot<R> {
        &self.slot
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Up to `k` records nearest to `query`.
    ///
    /// A missing index, an unavailable encoder or a blank query give an
    /// empty result, not an error. Encoder and dimension failures are
    /// errors.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<R>> {
        let Some(index) = self.slot.snapshot() else {
            return Ok(Vec::new());
        };
        if !self.encoder.is_available() || query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.encoder.encode_one(query).await?;
        let hits = index.search(&vector, k)?;

        tracing::debug!("{} index: {} hits for '{}'", self.name, hits.len(), query);
        Ok(hits.into_iter().map(|(record, _)| record.clone()).collect())
    }
}

/// Build an index, logging and returning `None` on failure.
pub async fn build_or_log<R, F>(
    name: &str,
    records: Vec<R>,
    extract: F,
    encoder: &Encoder,
) -> Option<VectorIndex<R>>
where
    F: Fn(&R) -> &str,
{
    if !encoder.is_available() {
        tracing::warn!("Skipping {} index: encoder unavailable", name);
        return None;
    }

    let count = records.len();
    match VectorIndex::build(records, extract, encoder).await {
        Ok(index) => {
            tracing::info!(
                "Created {} index with {} embeddings ({} dims)",
                name,
                count,
                index.dimensions()
            );
            Some(index)
        }
        Err(e) => {
            tracing::error!("{} index creation failed: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    fn encoder() -> Encoder {
        Encoder::new(Arc::new(TrigramProvider::new(256)), 2)
    }

    #[test]
    fn test_search_nearest_first() {
        let index = VectorIndex::from_parts(
            vec!["far", "near", "middle"],
            vec![vec![10.0, 0.0], vec![1.0, 0.0], vec![5.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<&str> = hits.iter().map(|(r, _)| **r).collect();
        assert_eq!(order, vec!["near", "middle", "far"]);
        assert_eq!(hits[0].1, 1.0);
    }

    #[test]
    fn test_ties_keep_build_order() {
        let index = VectorIndex::from_parts(
            vec!["first", "second", "third"],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let order: Vec<&str> = hits.iter().map(|(r, _)| **r).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = VectorIndex::from_parts(vec![1, 2], vec![vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(index.search(&[0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = VectorIndex::from_parts(vec![1], vec![vec![0.0, 1.0]]).unwrap();
        let err = index.search(&[0.0], 1).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }

    #[test]
    fn test_from_parts_rejects_ragged_vectors() {
        let result = VectorIndex::from_parts(vec![1, 2], vec![vec![0.0, 1.0], vec![0.0]]);
        assert!(result.is_err());

        let result = VectorIndex::from_parts(vec![1, 2], vec![vec![0.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_rejects_non_finite() {
        let vectors: Vec<Vec<f32>> = (0..40)
            .map(|i| if i % 3 == 0 { vec![f32::NAN] } else { vec![i as f32] })
            .collect();
        let err = VectorIndex::from_parts((0..40).collect(), vectors).unwrap_err();
        assert!(err.to_string().contains("Non-finite"));

        let result = VectorIndex::from_parts(vec![1, 2], vec![vec![0.0], vec![f32::INFINITY]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_with_nan_query_does_not_panic() {
        let index =
            VectorIndex::from_parts((0..40).collect(), (0..40).map(|i| vec![i as f32]).collect())
                .unwrap();

        let hits = index.search(&[f32::NAN], 5).unwrap();
        assert_eq!(hits.len(), 5);

        let hits = index.search(&[0.0], 5).unwrap();
        let order: Vec<i32> = hits.iter().map(|(r, _)| **r).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_build_keeps_positions() {
        let records = vec![
            ("Frontend Developer".to_string(), "react typescript css".to_string()),
            ("Nurse".to_string(), "patient care hospital ward".to_string()),
        ];
        let index = VectorIndex::build(records, |r| r.1.as_str(), &encoder())
            .await
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.records()[1].0, "Nurse");

        let query = encoder().encode_one("hospital patient care").await.unwrap();
        let hits = index.search(&query, 1).unwrap();
        assert_eq!(hits[0].0 .0, "Nurse");
    }

    #[tokio::test]
    async fn test_build_with_unavailable_encoder_fails() {
        let result = VectorIndex::build(vec!["x"], |r| *r, &Encoder::unavailable()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_build_empty_fails() {
        let result = VectorIndex::<&str>::build(Vec::new(), |r| *r, &encoder()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_searcher_guards() {
        let searcher = CorpusSearcher::build(
            "jobs",
            vec!["data analyst".to_string(), "chef".to_string()],
            |r| r.as_str(),
            encoder(),
        )
        .await;

        assert!(searcher.slot().is_available());
        assert!(searcher.search("", 2).await.unwrap().is_empty());
        assert!(searcher.search("   ", 2).await.unwrap().is_empty());
        assert_eq!(searcher.search("data analyst", 1).await.unwrap(), vec!["data analyst"]);

        let absent: CorpusSearcher<String> = CorpusSearcher::new("jobs", None, encoder());
        assert!(absent.search("data analyst", 2).await.unwrap().is_empty());

        let no_encoder = CorpusSearcher::build(
            "jobs",
            vec!["data analyst".to_string()],
            |r| r.as_str(),
            Encoder::unavailable(),
        )
        .await;
        assert!(!no_encoder.slot().is_available());
        assert!(no_encoder.search("data analyst", 2).await.unwrap().is_empty());
    }

    #[test]
    fn test_slot_replace_is_atomic_swap() {
        let slot = IndexSlot::new(Some(
            VectorIndex::from_parts(vec!["old"], vec![vec![0.0]]).unwrap(),
        ));
        let before = slot.snapshot().unwrap();

        let previous = slot.replace(Some(
            VectorIndex::from_parts(vec!["new"], vec![vec![0.0]]).unwrap(),
        ));

        // The reader's snapshot is unaffected by the swap
        assert_eq!(before.records(), &["old"]);
        assert_eq!(previous.unwrap().records(), &["old"]);
        assert_eq!(slot.snapshot().unwrap().records(), &["new"]);

        slot.replace(None);
        assert!(!slot.is_available());
    }
}
