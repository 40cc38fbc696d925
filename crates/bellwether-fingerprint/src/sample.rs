//! Raw probe observations.
//!
//! A [`Sample`] is one observed invocation of one tool: the arguments sent,
//! whether the call succeeded, how long it took, and what came back. Samples
//! are the sole input to every fingerprinting function in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The call returned a result.
    Success,
    /// The call returned a JSON-RPC error, a tool-level error, or failed at
    /// the transport layer.
    Error,
}

/// One observed tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Name of the tool that was invoked.
    pub tool_name: String,

    /// Arguments sent with the call.
    pub args: Value,

    /// Whether the call succeeded.
    pub outcome: Outcome,

    /// Wall-clock duration of the call in milliseconds.
    pub duration_ms: u64,

    /// Response content for successful calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_content: Option<Value>,

    /// Error message for failed calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the call was observed.
    pub observed_at: DateTime<Utc>,
}

impl Sample {
    /// Builds a success sample.
    pub fn success(
        tool_name: impl Into<String>,
        args: Value,
        duration_ms: u64,
        response: Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
            outcome: Outcome::Success,
            duration_ms,
            response_content: Some(response),
            error_message: None,
            observed_at: Utc::now(),
        }
    }

    /// Builds an error sample.
    pub fn error(
        tool_name: impl Into<String>,
        args: Value,
        duration_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
            outcome: Outcome::Error,
            duration_ms,
            response_content: None,
            error_message: Some(message.into()),
            observed_at: Utc::now(),
        }
    }

    /// Returns true if the call succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}
