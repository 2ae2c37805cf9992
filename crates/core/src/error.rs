//! Error types for the Asha context builder.
//!
//! A single error enum covers every failure category the engine can
//! report: configuration, I/O, dataset loading, embeddings, vector
//! indices, live sources and serialization. Only the context facade
//! collapses these into a user-facing message; every other layer
//! propagates them.

use thiserror::Error;

/// Unified error type for the Asha crates.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local corpus loading errors (CSV / JSON datasets)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index build or search errors
    #[error("Index error: {0}")]
    Index(String),

    /// Live source (job / event API) errors
    #[error("Source error: {0}")]
    Source(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Dataset(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
