//! # Baseline Comparator
//!
//! Pairwise diff of two baselines: tool-set membership, per-aspect drift on
//! every shared tool (schema, description, response structure, error
//! patterns, schema evolution, latency, security, behavior hints), graded
//! on the `none < info < warning < breaking` lattice with per-change
//! confidence. Aspects a protocol revision cannot express on both sides are
//! gated out symmetrically.

mod aspects;
mod compare;
mod diff;
mod error;
mod gating;
mod options;
mod schema_diff;
mod severity;

pub use compare::{compare, compare_with};
pub use diff::{
    Aspect, BehaviorChange, Change, Diff, DocumentationScoreReport, ErrorTrend, ErrorTrendReport,
    ModifiedTool, PerfRegression, PerformanceReport, SchemaEvolutionReport, SecurityReport,
    ToolChangeFlags,
};
pub use error::{CompareError, Result};
pub use gating::{feature_flags, shared_flags, FeatureFlag};
pub use options::CompareOptions;
pub use schema_diff::{compare_input_schemas, SchemaFinding};
pub use severity::Severity;
