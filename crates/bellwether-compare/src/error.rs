//! Comparator errors.

use thiserror::Error;

/// Failures surfaced by the comparator.
///
/// The comparator never downgrades drift silently: anything that prevents a
/// trustworthy comparison is returned to the caller.
#[derive(Debug, Error)]
pub enum CompareError {
    /// An internal comparison step panicked.
    #[error("comparison failed: {0}")]
    Internal(String),
}

/// Result type for comparator operations.
pub type Result<T> = std::result::Result<T, CompareError>;
