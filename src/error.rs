//! Crate-wide error taxonomy
//!
//! Ingestion and training convert these into structured reports at the
//! public boundary; inference converts them into error-status prediction
//! results. Nothing in this taxonomy is expected to cross an HTTP handler
//! as a panic.

use thiserror::Error;

/// Errors produced by ingestion, preprocessing, training and persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// Input bytes could not be decoded or parsed as tabular data,
    /// or a dataset is structurally unusable (missing/non-binary target).
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Too few rows remained after preparation to fit a model.
    #[error("insufficient training data: {rows} rows, minimum {min}")]
    InsufficientData { rows: usize, min: usize },

    /// No trained model exists for the (kind, tenant) pair, in memory or on disk.
    #[error("no trained model for kind '{kind}' tenant '{tenant}'")]
    ModelNotFound { kind: String, tenant: String },

    /// Stored preprocessing state does not line up with the presented data.
    /// Raised only when degraded handling (fallback codes, unscaled
    /// pass-through) cannot apply, such as a missing training column.
    #[error("preprocessing mismatch: {0}")]
    PreprocessingMismatch(String),

    /// Disk I/O failure while saving or loading artifacts.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Artifact blob could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for calificar operations.
pub type Result<T> = std::result::Result<T, Error>;
