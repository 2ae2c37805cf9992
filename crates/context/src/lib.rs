//! Retrieval and aggregation engine for grounding chat responses.
//!
//! A query is expanded into variations, each variation is searched against
//! two local embedding indices (jobs and sessions) and two live sources
//! (job listings and events), and the merged results are deduplicated and
//! rendered into labelled text sections.

pub mod aggregator;
pub mod context;
pub mod corpus;
pub mod embeddings;
pub mod expander;
pub mod format;
pub mod index;
pub mod query;
pub mod records;
pub mod sources;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use aggregator::{AggregatedResults, Aggregator};
pub use context::{
    ContextService, ContextServiceBuilder, ContextStatus, ERROR_MESSAGE, INVALID_QUERY_MESSAGE,
    NO_RESULTS_MESSAGE,
};
pub use embeddings::{EmbeddingProvider, Encoder};
pub use expander::QueryExpander;
pub use index::{CorpusSearcher, IndexSlot, VectorIndex};
pub use query::{detect_ambiguity, detect_bias, extract_location, BiasType};
pub use records::{JobRecord, LiveEvent, LiveJob, SessionRecord};
pub use sources::{EventSource, JobSource};
