//! # Per-Aspect Comparison
//!
//! One function per aspect of a tool record. Each returns graded changes
//! for that aspect alone; the top-level comparator decides which aspects
//! participate (protocol gating, ignore lists) and folds the results.

use crate::diff::{Aspect, Change, PerfRegression};
use crate::gating::FeatureFlag;
use crate::schema_diff::compare_input_schemas;
use crate::severity::Severity;
use bellwether_baseline::ToolRecord;
use bellwether_fingerprint::{PerfConfidence, RiskLevel};
use bellwether_semantic::{extract_categories, ChangeConfidence};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Input schema drift, plus output schema drift when the field is
/// observable in both baselines.
pub fn schema_changes(
    before: &ToolRecord,
    after: &ToolRecord,
    shared: &BTreeSet<FeatureFlag>,
) -> Vec<Change> {
    let mut out = Vec::new();

    if before.descriptor.schema_hash != after.descriptor.schema_hash {
        let findings =
            compare_input_schemas(&before.descriptor.input_schema, &after.descriptor.input_schema);
        let severity = findings.iter().map(|f| f.severity).max().unwrap_or(Severity::Info);
        let description = if findings.is_empty() {
            "input schema changed".to_string()
        } else {
            findings
                .iter()
                .map(|f| f.description.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };
        out.push(Change {
            aspect: Aspect::Schema,
            before: before.descriptor.input_schema.clone(),
            after: after.descriptor.input_schema.clone(),
            severity,
            description,
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        });
    }

    if shared.contains(&FeatureFlag::OutputSchema)
        && before.descriptor.output_schema != after.descriptor.output_schema
    {
        out.push(Change {
            aspect: Aspect::Schema,
            before: before.descriptor.output_schema.clone().unwrap_or(Value::Null),
            after: after.descriptor.output_schema.clone().unwrap_or(Value::Null),
            severity: Severity::Warning,
            description: "declared output schema changed".to_string(),
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        });
    }

    out
}

/// Description (and, when observable, title) drift.
pub fn description_changes(
    before: &ToolRecord,
    after: &ToolRecord,
    shared: &BTreeSet<FeatureFlag>,
) -> Vec<Change> {
    let mut out = Vec::new();

    let old_text = &before.descriptor.description;
    let new_text = &after.descriptor.description;
    if old_text != new_text {
        let confidence = ChangeConfidence::semantic(old_text, new_text);

        // A wording tweak is cosmetic; the description jumping categories
        // (say, read-only phrasing turning destructive) deserves review.
        let old_category = extract_categories(old_text).into_iter().next().map(|m| m.category);
        let new_category = extract_categories(new_text).into_iter().next().map(|m| m.category);
        let severity = if old_category == new_category {
            Severity::Info
        } else {
            Severity::Warning
        };

        out.push(Change {
            aspect: Aspect::Description,
            before: json!(old_text),
            after: json!(new_text),
            severity,
            description: format!(
                "description changed (similarity {}%)",
                bellwether_semantic::semantic_score(old_text, new_text)
            ),
            confidence: Some(confidence),
            low_confidence: false,
        });
    }

    if shared.contains(&FeatureFlag::ToolTitle) && before.descriptor.title != after.descriptor.title
    {
        out.push(Change {
            aspect: Aspect::Description,
            before: json!(before.descriptor.title),
            after: json!(after.descriptor.title),
            severity: Severity::Info,
            description: "title changed".to_string(),
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        });
    }

    out
}

/// Response structure drift from the aggregated fingerprints.
pub fn response_structure_change(before: &ToolRecord, after: &ToolRecord) -> Option<Change> {
    let old = before.response_fingerprint.as_ref()?;
    let new = after.response_fingerprint.as_ref()?;
    if old.sample_count == 0 || new.sample_count == 0 {
        return None;
    }

    if old.structure_hash == new.structure_hash && old.content_type == new.content_type {
        return None;
    }

    // Emptiness transitions are graded harder than reshaping: a response
    // that vanished breaks consumers outright.
    let severity = if !old.is_empty && new.is_empty {
        Severity::Breaking
    } else {
        Severity::Warning
    };

    let old_fields: BTreeSet<&String> = old.fields.iter().collect();
    let new_fields: BTreeSet<&String> = new.fields.iter().collect();
    let added: Vec<&str> = new_fields.difference(&old_fields).map(|s| s.as_str()).collect();
    let removed: Vec<&str> = old_fields.difference(&new_fields).map(|s| s.as_str()).collect();

    let mut description = "response structure changed".to_string();
    if !added.is_empty() {
        description.push_str(&format!("; fields added: {added:?}"));
    }
    if !removed.is_empty() {
        description.push_str(&format!("; fields removed: {removed:?}"));
    }

    Some(Change {
        aspect: Aspect::ResponseStructure,
        before: json!({
            "structureHash": old.structure_hash,
            "contentType": old.content_type,
            "fields": old.fields,
        }),
        after: json!({
            "structureHash": new.structure_hash,
            "contentType": new.content_type,
            "fields": new.fields,
        }),
        severity,
        description,
        confidence: Some(ChangeConfidence::structural()),
        low_confidence: false,
    })
}

/// Error-pattern category drift. Also returns the raw category movements
/// for the trend report.
pub fn error_pattern_changes(
    before: &ToolRecord,
    after: &ToolRecord,
) -> (Vec<Change>, Vec<String>, Vec<String>) {
    let label = |category| {
        serde_json::to_value(&category)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default()
    };
    let old_categories: BTreeSet<String> =
        before.error_patterns.iter().map(|p| label(p.category)).collect();
    let new_categories: BTreeSet<String> =
        after.error_patterns.iter().map(|p| label(p.category)).collect();

    let appeared: Vec<String> = new_categories.difference(&old_categories).cloned().collect();
    let resolved: Vec<String> = old_categories.difference(&new_categories).cloned().collect();

    let mut out = Vec::new();
    if !appeared.is_empty() {
        out.push(Change {
            aspect: Aspect::ErrorPattern,
            before: json!(old_categories),
            after: json!(new_categories),
            severity: Severity::Warning,
            description: format!("new error categories observed: {appeared:?}"),
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        });
    }
    if !resolved.is_empty() {
        out.push(Change {
            aspect: Aspect::ErrorPattern,
            before: json!(old_categories),
            after: json!(new_categories),
            severity: Severity::Info,
            description: format!("error categories no longer observed: {resolved:?}"),
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        });
    }

    (out, appeared, resolved)
}

/// Response-schema evolution drift: lost stability, or a breaking change
/// between the latest inferred schemas.
pub fn evolution_change(before: &ToolRecord, after: &ToolRecord) -> Option<Change> {
    let old = before.schema_evolution.as_ref()?;
    let new = after.schema_evolution.as_ref()?;

    let mut severity = Severity::None;
    let mut notes = Vec::new();

    if old.stability.is_stable && !new.stability.is_stable {
        severity = severity.max(Severity::Warning);
        notes.push(format!(
            "response schema became unstable (inconsistent fields: {:?})",
            new.stability.inconsistent_fields
        ));
    }

    if let (Some(old_latest), Some(new_latest)) = (old.latest(), new.latest()) {
        if old_latest.hash != new_latest.hash {
            let old_props = old_latest.schema.properties.clone().unwrap_or_default();
            let new_props = new_latest.schema.properties.clone().unwrap_or_default();
            let old_required = old_latest.schema.required.clone().unwrap_or_default();

            for name in &old_required {
                if !new_props.contains_key(name) {
                    severity = severity.max(Severity::Breaking);
                    notes.push(format!("response field '{name}' disappeared"));
                }
            }
            for (name, old_schema) in &old_props {
                if let Some(new_schema) = new_props.get(name) {
                    if old_schema.schema_type != new_schema.schema_type
                        && old_schema.schema_type != "mixed"
                        && new_schema.schema_type != "mixed"
                    {
                        severity = severity.max(Severity::Breaking);
                        notes.push(format!(
                            "response field '{name}' changed type: {} -> {}",
                            old_schema.schema_type, new_schema.schema_type
                        ));
                    }
                }
            }

            if notes.is_empty() {
                severity = severity.max(Severity::Info);
                notes.push("response schema evolved compatibly".to_string());
            }
        }
    }

    if severity == Severity::None {
        return None;
    }

    Some(Change {
        aspect: Aspect::ResponseSchemaEvolution,
        before: json!(old.latest().map(|v| v.hash.clone())),
        after: json!(new.latest().map(|v| v.hash.clone())),
        severity,
        description: notes.join("; "),
        confidence: Some(ChangeConfidence::structural()),
        low_confidence: false,
    })
}

/// Latency drift across the stored percentiles.
///
/// Returns the graded change (if any) plus every per-percentile movement
/// beyond the threshold for the roll-up report.
pub fn performance_change(
    before: &ToolRecord,
    after: &ToolRecord,
    threshold: f64,
) -> (Option<Change>, Vec<PerfRegression>, Vec<PerfRegression>) {
    let old = match &before.performance {
        Some(p) => p,
        None => return (None, Vec::new(), Vec::new()),
    };
    let new = match &after.performance {
        Some(p) => p,
        None => return (None, Vec::new(), Vec::new()),
    };

    let trusted = confidence_is_trusted(old.confidence) && confidence_is_trusted(new.confidence);

    let mut regressions = Vec::new();
    let mut improvements = Vec::new();
    let mut worst: Option<PerfRegression> = None;

    for (metric, old_value, new_value) in [
        ("p50", old.p50, new.p50),
        ("p95", old.p95, new.p95),
        ("p99", old.p99, new.p99),
    ] {
        if old_value <= 0.0 {
            continue;
        }
        let regression = (new_value - old_value) / old_value;

        if regression >= threshold {
            let severity = if !trusted {
                Severity::Info
            } else if regression >= threshold * 2.0 {
                Severity::Breaking
            } else {
                Severity::Warning
            };
            let entry = PerfRegression {
                tool: before.descriptor.name.clone(),
                metric: metric.to_string(),
                before_ms: old_value,
                after_ms: new_value,
                regression_percent: regression,
                severity,
                low_confidence: !trusted,
            };
            let is_worse = worst
                .as_ref()
                .map(|w| regression > w.regression_percent)
                .unwrap_or(true);
            if is_worse {
                worst = Some(entry.clone());
            }
            regressions.push(entry);
        } else if regression <= -threshold {
            improvements.push(PerfRegression {
                tool: before.descriptor.name.clone(),
                metric: metric.to_string(),
                before_ms: old_value,
                after_ms: new_value,
                regression_percent: regression,
                severity: Severity::Info,
                low_confidence: !trusted,
            });
        }
    }

    let change = worst.map(|w| Change {
        aspect: Aspect::Performance,
        before: json!({"p50": old.p50, "p95": old.p95, "p99": old.p99}),
        after: json!({"p50": new.p50, "p95": new.p95, "p99": new.p99}),
        severity: w.severity,
        description: format!(
            "{} regressed {:.0}% ({:.1}ms -> {:.1}ms)",
            w.metric,
            w.regression_percent * 100.0,
            w.before_ms,
            w.after_ms
        ),
        confidence: Some(ChangeConfidence::structural()),
        low_confidence: w.low_confidence,
    });

    (change, regressions, improvements)
}

fn confidence_is_trusted(confidence: PerfConfidence) -> bool {
    matches!(confidence, PerfConfidence::High | PerfConfidence::Medium)
}

/// Security posture drift. Returns the graded change plus new/resolved
/// finding labels for the roll-up report.
pub fn security_change(
    before: &ToolRecord,
    after: &ToolRecord,
) -> (Option<Change>, Vec<String>, Vec<String>) {
    let finding_key = |f: &bellwether_fingerprint::SecurityFinding| {
        format!("{}:{}", f.category, f.title)
    };

    let old_findings: BTreeSet<String> = before
        .security
        .iter()
        .flat_map(|s| s.findings.iter().map(finding_key))
        .collect();
    let new_fingerprint = match &after.security {
        Some(s) => s,
        None => return (None, Vec::new(), Vec::new()),
    };

    let mut new_labels = Vec::new();
    let mut max_new_risk: Option<RiskLevel> = None;
    for finding in &new_fingerprint.findings {
        let key = finding_key(finding);
        if !old_findings.contains(&key) {
            new_labels.push(key);
            max_new_risk = Some(match max_new_risk {
                Some(r) => r.max(finding.risk_level),
                None => finding.risk_level,
            });
        }
    }

    let current_keys: BTreeSet<String> =
        new_fingerprint.findings.iter().map(finding_key).collect();
    let resolved_labels: Vec<String> = old_findings
        .iter()
        .filter(|k| !current_keys.contains(*k))
        .cloned()
        .collect();

    // Resolved findings are reported but never raise severity.
    let change = max_new_risk.map(|risk| {
        let severity = match risk {
            RiskLevel::Critical | RiskLevel::High => Severity::Breaking,
            RiskLevel::Medium => Severity::Warning,
            RiskLevel::Low | RiskLevel::Info => Severity::Info,
        };
        Change {
            aspect: Aspect::Security,
            before: json!(before.security.as_ref().map(|s| s.risk_score).unwrap_or(0)),
            after: json!(new_fingerprint.risk_score),
            severity,
            description: format!("new security findings: {new_labels:?}"),
            confidence: Some(ChangeConfidence::structural()),
            low_confidence: false,
        }
    });

    (change, new_labels, resolved_labels)
}

/// Behavior-hint drift, only meaningful when both protocols carry
/// annotations.
pub fn annotation_change(before: &ToolRecord, after: &ToolRecord) -> Option<Change> {
    let old = before.descriptor.annotations.clone().unwrap_or_default();
    let new = after.descriptor.annotations.clone().unwrap_or_default();

    let mut flips = Vec::new();
    if old.destructive_hint != new.destructive_hint {
        flips.push("destructiveHint");
    }
    if old.read_only_hint != new.read_only_hint {
        flips.push("readOnlyHint");
    }
    if old.idempotent_hint != new.idempotent_hint {
        flips.push("idempotentHint");
    }
    if flips.is_empty() {
        return None;
    }

    Some(Change {
        aspect: Aspect::ToolAnnotations,
        before: serde_json::to_value(&old).unwrap_or(Value::Null),
        after: serde_json::to_value(&new).unwrap_or(Value::Null),
        severity: Severity::Warning,
        description: format!("behavior hints changed: {flips:?}"),
        confidence: Some(ChangeConfidence::structural()),
        low_confidence: false,
    })
}
