//! # Interview Engine
//!
//! Drives the full observation run against a live tool server: discovery
//! feeds a persona-filtered probe battery per tool, a bounded worker pool
//! executes the calls under layered deadlines, fingerprinting folds the
//! samples into comparable artifacts, and synthesis seals the result into
//! a baseline.
//!
//! The engine is resilient by construction: per-call failures become error
//! samples, per-tool failures become partial records, and a dead session
//! still yields a baseline flagged partial when the caller allows it.

mod assess;
mod cache;
mod config;
mod engine;
mod error;
mod personas;
mod probe_hook;
mod progress;
mod synthesize;

pub use assess::matches_expectation;
pub use cache::ResponseCache;
pub use config::InterviewConfig;
pub use engine::{InterviewEngine, InterviewResult};
pub use error::{InterviewError, Result};
pub use personas::{resolve as resolve_personas, Persona};
pub use probe_hook::SecurityProbe;
pub use progress::{InterviewPhase, ProgressEvent, ProgressReporter};
pub use synthesize::create_baseline;
