//! Diff model.
//!
//! The structured output of a comparison: per-tool aspect changes with
//! severities and confidences, roll-up reports per concern, and the overall
//! grade. A diff is a pure function of its two input baselines.

use crate::severity::Severity;
use bellwether_semantic::{ChangeConfidence, ConfidenceSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The aspect of a tool a change concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Schema,
    Description,
    ResponseStructure,
    ErrorPattern,
    ResponseSchemaEvolution,
    Performance,
    Security,
    ToolAnnotations,
}

/// One detected change on one aspect of one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub aspect: Aspect,
    pub before: Value,
    pub after: Value,
    pub severity: Severity,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ChangeConfidence>,

    /// Set when thin evidence forced the severity down.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub low_confidence: bool,
}

/// Which aspects of a tool changed, at a glance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolChangeFlags {
    pub schema_changed: bool,
    pub description_changed: bool,
    pub response_structure_changed: bool,
    pub error_patterns_changed: bool,
    pub response_schema_evolution_changed: bool,
    pub security_changed: bool,
}

/// A tool present in both baselines with at least one changed aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedTool {
    pub tool: String,
    pub changes: Vec<Change>,
    pub flags: ToolChangeFlags,

    /// Inverse-confidence-weighted aggregate over the changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate_confidence: Option<u32>,
}

/// A runtime-behavior change, flattened for report consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorChange {
    pub tool: String,
    pub aspect: Aspect,
    pub description: String,
    pub severity: Severity,
}

/// One latency regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfRegression {
    pub tool: String,
    pub metric: String,
    pub before_ms: f64,
    pub after_ms: f64,
    /// `(after - before) / before`.
    pub regression_percent: f64,
    pub severity: Severity,
    pub low_confidence: bool,
}

/// Latency roll-up across the surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub regressions: Vec<PerfRegression>,
    pub improvements: Vec<PerfRegression>,
}

/// Security roll-up across the surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReport {
    /// True when the aggregate risk score rose.
    pub degraded: bool,
    pub previous_risk_score: u32,
    pub current_risk_score: u32,
    pub new_findings: Vec<String>,
    pub resolved_findings: Vec<String>,
}

/// Response-schema stability roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEvolutionReport {
    pub became_unstable: Vec<String>,
    pub breaking_changes: Vec<String>,
}

/// Error-pattern trend per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTrend {
    pub tool: String,
    pub new_categories: Vec<String>,
    pub resolved_categories: Vec<String>,
}

/// Error-pattern roll-up across the surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTrendReport {
    pub trends: Vec<ErrorTrend>,
}

/// Documentation score movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationScoreReport {
    pub before: u32,
    pub after: u32,
    pub delta: i64,
}

/// The structured result of comparing two baselines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub tools_added: Vec<String>,
    pub tools_removed: Vec<String>,
    pub tools_modified: Vec<ModifiedTool>,
    pub behavior_changes: Vec<BehaviorChange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_report: Option<PerformanceReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_report: Option<SecurityReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_evolution_report: Option<SchemaEvolutionReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_trend_report: Option<ErrorTrendReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_score_report: Option<DocumentationScoreReport>,

    pub severity: Severity,
    pub breaking_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub summary: String,
    pub confidence: ConfidenceSummary,
}

impl Diff {
    /// True when nothing at all drifted.
    pub fn is_clean(&self) -> bool {
        self.severity == Severity::None
    }
}
