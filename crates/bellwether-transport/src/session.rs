//! The session abstraction over concrete transports.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A live JSON-RPC session with a tool server.
///
/// Implementations must tolerate concurrent `call`s; responses are routed
/// back to their callers by request id. A call that exceeds its deadline
/// resolves to [`crate::TransportError::Timeout`] and any late response for
/// that id is discarded.
#[async_trait]
pub trait Session: Send + Sync {
    /// Sends a request and awaits its response within the deadline.
    async fn call(&self, method: &str, params: Option<Value>, timeout: Duration) -> Result<Value>;

    /// Sends a fire-and-forget notification.
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// Tears the session down. Safe to call more than once.
    async fn disconnect(&self);
}
