//! Error types for baseline persistence.

use thiserror::Error;

/// Errors surfaced by baseline save, load, and migration.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The stored integrity hash does not match the recomputed one.
    #[error("integrity hash mismatch: expected {expected}, computed {actual}")]
    Integrity { expected: String, actual: String },

    /// The file declares a format version this build cannot read.
    #[error("unsupported baseline format version {0}")]
    UnsupportedFormat(u64),

    /// The file is not a baseline document at all.
    #[error("malformed baseline document: {0}")]
    Malformed(String),

    /// Filesystem failure.
    #[error("baseline I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("baseline serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for baseline operations.
pub type Result<T> = std::result::Result<T, BaselineError>;
