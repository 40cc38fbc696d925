//! Error types for the interview engine.

use bellwether_transport::TransportError;
use thiserror::Error;

/// Errors that abort an interview outright.
///
/// Per-call transport failures never surface here; they are recorded as
/// error samples against their tool. This type covers the cases where no
/// baseline (or only a partial one) can come out of the run.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// The session died and `graceful_partial` was disabled.
    #[error("interview aborted: {0}")]
    Transport(#[from] TransportError),

    /// Discovery never produced a usable surface.
    #[error("interview failed: {0}")]
    Fatal(String),
}

/// Result type for interview operations.
pub type Result<T> = std::result::Result<T, InterviewError>;
