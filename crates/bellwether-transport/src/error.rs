//! Transport error taxonomy.

use thiserror::Error;

/// Errors surfaced by the JSON-RPC client transports.
///
/// Per-call failures (`Timeout`, `Rpc`) are recorded by the caller as error
/// observations; session-level failures (`Startup`, `Closed`) abort the
/// interview and force a partial synthesis.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target process exited before becoming ready.
    #[error("server failed to start: {0}")]
    Startup(String),

    /// The connection went away mid-request.
    #[error("transport closed unexpectedly")]
    Closed,

    /// A call exceeded its deadline.
    #[error("request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    /// A frame could not be parsed, or the response shape was wrong.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Underlying I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP-level failure.
    #[error("http transport error: {0}")]
    Http(String),
}

impl TransportError {
    /// True for failures that invalidate the whole session rather than a
    /// single call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::Startup(_) | TransportError::Closed | TransportError::Io(_)
        )
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
