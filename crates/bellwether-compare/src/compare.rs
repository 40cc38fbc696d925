//! # Baseline Comparison
//!
//! Maps two immutable baselines to a structured diff. Tool-set membership
//! is graded first (added is informational, removed is breaking), then every
//! tool present in both baselines is walked aspect by aspect, with the
//! protocol-version gate deciding which aspects are observable on both
//! sides. The result is deterministic for a given pair of inputs.

use crate::aspects;
use crate::diff::{
    Aspect, BehaviorChange, Change, Diff, DocumentationScoreReport, ErrorTrend, ErrorTrendReport,
    ModifiedTool, PerformanceReport, SchemaEvolutionReport, SecurityReport, ToolChangeFlags,
};
use crate::error::{CompareError, Result};
use crate::gating::{shared_flags, FeatureFlag};
use crate::options::CompareOptions;
use crate::severity::Severity;
use bellwether_baseline::{Baseline, ToolRecord};
use bellwether_semantic::{aggregate_inverse_weighted, ChangeConfidence, ConfidenceSummary};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Compares two baselines with default options.
pub fn compare(before: &Baseline, after: &Baseline) -> Result<Diff> {
    compare_with(before, after, &CompareOptions::default())
}

/// Compares two baselines.
///
/// The comparator never mutates its inputs and never swallows its own
/// failures: an internal panic surfaces as [`CompareError::Internal`]
/// instead of a silently incomplete diff.
pub fn compare_with(
    before: &Baseline,
    after: &Baseline,
    options: &CompareOptions,
) -> Result<Diff> {
    catch_unwind(AssertUnwindSafe(|| compare_inner(before, after, options)))
        .map_err(|_| CompareError::Internal("comparator panicked".to_string()))
}

fn compare_inner(before: &Baseline, after: &Baseline, options: &CompareOptions) -> Diff {
    let shared = shared_flags(
        &before.server.protocol_version,
        &after.server.protocol_version,
    );
    debug!(?shared, "comparing baselines");

    let old_tools: BTreeMap<&str, &ToolRecord> = before
        .capabilities
        .tools
        .iter()
        .map(|t| (t.descriptor.name.as_str(), t))
        .collect();
    let new_tools: BTreeMap<&str, &ToolRecord> = after
        .capabilities
        .tools
        .iter()
        .map(|t| (t.descriptor.name.as_str(), t))
        .collect();

    let tools_added: Vec<String> = new_tools
        .keys()
        .filter(|name| !old_tools.contains_key(*name))
        .map(|s| s.to_string())
        .collect();
    let tools_removed: Vec<String> = old_tools
        .keys()
        .filter(|name| !new_tools.contains_key(*name))
        .map(|s| s.to_string())
        .collect();

    let mut tools_modified = Vec::new();
    let mut behavior_changes = Vec::new();
    let mut confidences: Vec<ChangeConfidence> = Vec::new();

    let mut perf_report = PerformanceReport::default();
    let mut evolution_report = SchemaEvolutionReport::default();
    let mut error_trends = Vec::new();
    let mut new_finding_labels = Vec::new();
    let mut resolved_finding_labels = Vec::new();

    for (name, old) in &old_tools {
        let new = match new_tools.get(name) {
            Some(n) => n,
            None => continue,
        };

        let mut changes: Vec<Change> = Vec::new();

        changes.extend(aspects::schema_changes(old, new, &shared));
        changes.extend(aspects::description_changes(old, new, &shared));

        if let Some(change) = aspects::response_structure_change(old, new) {
            changes.push(change);
        }

        let (error_changes, appeared, resolved) = aspects::error_pattern_changes(old, new);
        if !appeared.is_empty() || !resolved.is_empty() {
            error_trends.push(ErrorTrend {
                tool: name.to_string(),
                new_categories: appeared,
                resolved_categories: resolved,
            });
        }
        changes.extend(error_changes);

        if let Some(change) = aspects::evolution_change(old, new) {
            if change.severity >= Severity::Breaking {
                evolution_report.breaking_changes.push(name.to_string());
            } else if change.description.contains("unstable") {
                evolution_report.became_unstable.push(name.to_string());
            }
            changes.push(change);
        }

        let (perf_change, regressions, improvements) =
            aspects::performance_change(old, new, options.regression_threshold);
        perf_report.regressions.extend(regressions);
        perf_report.improvements.extend(improvements);
        if let Some(change) = perf_change {
            changes.push(change);
        }

        let (security, new_labels, resolved_labels) = aspects::security_change(old, new);
        new_finding_labels.extend(new_labels);
        resolved_finding_labels.extend(resolved_labels);
        if let Some(change) = security {
            changes.push(change);
        }

        if shared.contains(&FeatureFlag::Annotations) {
            if let Some(change) = aspects::annotation_change(old, new) {
                changes.push(change);
            }
        }

        // Caller filters: ignored aspects, then the confidence floor.
        changes.retain(|c| !options.ignore_aspects.contains(&c.aspect));
        if let Some(floor) = options.confidence_min {
            changes.retain(|c| c.confidence.map(|conf| conf.score >= floor).unwrap_or(true));
        }

        if changes.is_empty() {
            continue;
        }

        let flags = ToolChangeFlags {
            schema_changed: changes.iter().any(|c| c.aspect == Aspect::Schema),
            description_changed: changes.iter().any(|c| c.aspect == Aspect::Description),
            response_structure_changed: changes
                .iter()
                .any(|c| c.aspect == Aspect::ResponseStructure),
            error_patterns_changed: changes.iter().any(|c| c.aspect == Aspect::ErrorPattern),
            response_schema_evolution_changed: changes
                .iter()
                .any(|c| c.aspect == Aspect::ResponseSchemaEvolution),
            security_changed: changes.iter().any(|c| c.aspect == Aspect::Security),
        };

        for change in &changes {
            if matches!(
                change.aspect,
                Aspect::ResponseStructure
                    | Aspect::ErrorPattern
                    | Aspect::ResponseSchemaEvolution
                    | Aspect::Performance
            ) {
                behavior_changes.push(BehaviorChange {
                    tool: name.to_string(),
                    aspect: change.aspect,
                    description: change.description.clone(),
                    severity: change.severity,
                });
            }
            if let Some(confidence) = change.confidence {
                confidences.push(confidence);
            }
        }

        let scores: Vec<u32> = changes
            .iter()
            .filter_map(|c| c.confidence.map(|conf| conf.score))
            .collect();
        tools_modified.push(ModifiedTool {
            tool: name.to_string(),
            changes,
            flags,
            aggregate_confidence: aggregate_inverse_weighted(&scores),
        });
    }

    // Membership changes carry structural confidence.
    for _ in tools_added.iter().chain(tools_removed.iter()) {
        confidences.push(ChangeConfidence::structural());
    }

    let mut breaking_count = tools_removed.len();
    let mut warning_count = 0usize;
    let mut info_count = tools_added.len();
    for tool in &tools_modified {
        for change in &tool.changes {
            match change.severity {
                Severity::Breaking => breaking_count += 1,
                Severity::Warning => warning_count += 1,
                Severity::Info => info_count += 1,
                Severity::None => {}
            }
        }
    }

    let severity = overall_severity(breaking_count, warning_count, info_count);

    let security_report = build_security_report(
        before,
        after,
        new_finding_labels,
        resolved_finding_labels,
    );

    let documentation_score_report = match (before.documentation_score, after.documentation_score)
    {
        (Some(old), Some(new)) if old != new => Some(DocumentationScoreReport {
            before: old,
            after: new,
            delta: new as i64 - old as i64,
        }),
        _ => None,
    };

    let summary = format!(
        "{} added, {} removed, {} modified of {} tools; {} breaking, {} warning, {} info ({})",
        tools_added.len(),
        tools_removed.len(),
        tools_modified.len(),
        old_tools.len().max(new_tools.len()),
        breaking_count,
        warning_count,
        info_count,
        severity,
    );

    Diff {
        tools_added,
        tools_removed,
        tools_modified,
        behavior_changes,
        performance_report: if perf_report.regressions.is_empty()
            && perf_report.improvements.is_empty()
        {
            None
        } else {
            Some(perf_report)
        },
        security_report,
        schema_evolution_report: if evolution_report.became_unstable.is_empty()
            && evolution_report.breaking_changes.is_empty()
        {
            None
        } else {
            Some(evolution_report)
        },
        error_trend_report: if error_trends.is_empty() {
            None
        } else {
            Some(ErrorTrendReport {
                trends: error_trends,
            })
        },
        documentation_score_report,
        severity,
        breaking_count,
        warning_count,
        info_count,
        summary,
        confidence: ConfidenceSummary::summarize(&confidences),
    }
}

fn overall_severity(breaking: usize, warning: usize, info: usize) -> Severity {
    if breaking > 0 {
        Severity::Breaking
    } else if warning > 0 {
        Severity::Warning
    } else if info > 0 {
        Severity::Info
    } else {
        Severity::None
    }
}

fn build_security_report(
    before: &Baseline,
    after: &Baseline,
    new_findings: Vec<String>,
    resolved_findings: Vec<String>,
) -> Option<SecurityReport> {
    let total_risk = |baseline: &Baseline| -> (u32, bool) {
        let mut score = 0u32;
        let mut tested = false;
        for tool in &baseline.capabilities.tools {
            if let Some(security) = &tool.security {
                tested = tested || security.tested;
                score += security.risk_score;
            }
        }
        (score, tested)
    };

    let (previous_risk_score, old_tested) = total_risk(before);
    let (current_risk_score, new_tested) = total_risk(after);
    if !old_tested && !new_tested {
        return None;
    }

    Some(SecurityReport {
        degraded: current_risk_score > previous_risk_score,
        previous_risk_score,
        current_risk_score,
        new_findings,
        resolved_findings,
    })
}
