//! Error types for test-case generation.

use thiserror::Error;

/// Errors surfaced by the generator. Both are tool-local: the interview
/// records them against the tool and moves on.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The tool's input schema cannot drive generation.
    #[error("malformed input schema: {0}")]
    Schema(String),

    /// Generation itself failed.
    #[error("test generation failed: {0}")]
    Generation(String),
}

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
