//! Lossy progress reporting.
//!
//! The engine pushes phase and per-tool updates through a bounded channel
//! with `try_send`: when the consumer lags, updates are dropped rather than
//! blocking the interview. Progress is advisory; the baseline is the record.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

/// Interview lifecycle phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    Starting,
    Interviewing,
    Prompts,
    Resources,
    Workflows,
    Synthesizing,
    Complete,
}

/// One progress update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: InterviewPhase,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    pub completed: usize,
    pub total: usize,
}

/// Handle the engine emits progress through.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    /// A reporter that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A reporter plus the receiving end, with a small buffer.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Emits an update; silently drops it under backpressure.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            if tx.try_send(event).is_err() {
                trace!("progress update dropped under backpressure");
            }
        }
    }

    /// Convenience for a bare phase transition.
    pub fn phase(&self, phase: InterviewPhase) {
        self.emit(ProgressEvent {
            phase,
            tool: None,
            completed: 0,
            total: 0,
        });
    }

    /// Convenience for per-tool completion.
    pub fn tool_done(&self, phase: InterviewPhase, tool: &str, completed: usize, total: usize) {
        self.emit(ProgressEvent {
            phase,
            tool: Some(tool.to_string()),
            completed,
            total,
        });
    }
}
