//! # Schema Evolution History
//!
//! A bounded, append-only ring of the response schemas a tool has exhibited
//! over time, plus a stability analysis of the current observation window.
//!
//! A new history entry is recorded only when the observed schema hash
//! differs from the tail entry, so a stable tool accumulates exactly one
//! entry no matter how often it is observed. The ring drops its oldest
//! entries past the configured cap.
//!
//! Stability is judged from samples, not from the ring: a window is stable
//! when every top-level field is present (non-null) in every object sample
//! and carries a single type throughout.

use crate::canonical::hash_canonical;
use crate::infer::InferredSchema;
use crate::sample::Sample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default number of schema versions retained per tool.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// One observed schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    /// Canonical hash of the inferred schema.
    pub hash: String,

    /// The inferred schema itself.
    pub schema: InferredSchema,

    /// When this version was first observed.
    pub observed_at: DateTime<Utc>,

    /// How many samples backed the observation.
    pub sample_count: usize,
}

/// Stability analysis of the current observation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityReport {
    /// True when every field had full presence and a single type.
    pub is_stable: bool,

    /// Fields that were missing in some samples or carried clashing types.
    pub inconsistent_fields: Vec<String>,

    /// `consistency_ratio × sample_weight`; the weight approaches 1 as the
    /// sample count grows.
    pub stability_confidence: f64,
}

/// Bounded history of a tool's response schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEvolution {
    /// Retained versions, oldest first.
    pub versions: Vec<SchemaVersion>,

    /// Maximum number of versions retained.
    pub max_versions: usize,

    /// Stability of the latest observation window.
    pub stability: StabilityReport,
}

impl SchemaEvolution {
    /// Empty history with the given cap.
    pub fn new(max_versions: usize) -> Self {
        Self {
            versions: Vec::new(),
            max_versions: max_versions.max(1),
            stability: StabilityReport {
                is_stable: true,
                inconsistent_fields: Vec::new(),
                stability_confidence: 0.0,
            },
        }
    }

    /// Records an observation window: appends a version when the schema
    /// hash differs from the tail, and refreshes the stability report.
    pub fn observe(
        &mut self,
        schema: InferredSchema,
        samples: &[Sample],
        observed_at: DateTime<Utc>,
    ) {
        let hash = schema_hash(&schema);
        let differs = self
            .versions
            .last()
            .map(|tail| tail.hash != hash)
            .unwrap_or(true);

        if differs {
            self.versions.push(SchemaVersion {
                hash,
                schema,
                observed_at,
                sample_count: samples.len(),
            });
            while self.versions.len() > self.max_versions {
                self.versions.remove(0);
            }
        } else if let Some(tail) = self.versions.last_mut() {
            tail.sample_count += samples.len();
        }

        self.stability = analyze_stability(samples);
    }

    /// The most recent schema version, if any.
    pub fn latest(&self) -> Option<&SchemaVersion> {
        self.versions.last()
    }
}

/// Canonical hash of an inferred schema.
pub fn schema_hash(schema: &InferredSchema) -> String {
    let value = serde_json::to_value(schema).unwrap_or(Value::Null);
    let mut hash = hash_canonical(&value);
    hash.truncate(16);
    hash
}

/// Judges the stability of one observation window.
///
/// For every top-level field across the window's object samples this
/// computes a presence ratio and a type set. The window is stable when all
/// ratios are 1.0 and all type sets are singletons.
pub fn analyze_stability(samples: &[Sample]) -> StabilityReport {
    let objects: Vec<&serde_json::Map<String, Value>> = samples
        .iter()
        .filter_map(|s| s.response_content.as_ref())
        .filter_map(|v| v.as_object())
        .collect();

    if objects.is_empty() {
        return StabilityReport {
            is_stable: true,
            inconsistent_fields: Vec::new(),
            stability_confidence: 0.0,
        };
    }

    #[derive(Default)]
    struct FieldStat {
        present: usize,
        types: std::collections::BTreeSet<&'static str>,
    }

    let mut stats: BTreeMap<String, FieldStat> = BTreeMap::new();
    for object in &objects {
        for (key, value) in object.iter() {
            if value.is_null() {
                continue;
            }
            let stat = stats.entry(key.clone()).or_default();
            stat.present += 1;
            stat.types.insert(type_name(value));
        }
    }

    let total = objects.len();
    let mut inconsistent = Vec::new();
    let mut consistent = 0usize;
    for (field, stat) in &stats {
        if stat.present == total && stat.types.len() == 1 {
            consistent += 1;
        } else {
            inconsistent.push(field.clone());
        }
    }

    let consistency_ratio = if stats.is_empty() {
        1.0
    } else {
        consistent as f64 / stats.len() as f64
    };
    // Weight approaches 1 as the window grows; 5 samples weigh 0.5.
    let sample_weight = total as f64 / (total as f64 + 5.0);

    StabilityReport {
        is_stable: inconsistent.is_empty(),
        inconsistent_fields: inconsistent,
        stability_confidence: consistency_ratio * sample_weight,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer_from_samples;
    use serde_json::json;

    fn window(values: Vec<Value>) -> Vec<Sample> {
        values
            .into_iter()
            .map(|v| Sample::success("t", json!({}), 10, v))
            .collect()
    }

    #[test]
    fn identical_windows_record_one_version() {
        let mut history = SchemaEvolution::new(5);
        let samples = window(vec![json!({"a": 1}), json!({"a": 2})]);
        let schema = infer_from_samples(&samples).unwrap();

        history.observe(schema.clone(), &samples, Utc::now());
        history.observe(schema, &samples, Utc::now());

        assert_eq!(history.versions.len(), 1);
        assert_eq!(history.versions[0].sample_count, 4);
    }

    #[test]
    fn changed_schema_appends_a_version() {
        let mut history = SchemaEvolution::new(5);
        let first = window(vec![json!({"a": 1})]);
        let second = window(vec![json!({"a": 1, "b": "x"})]);

        history.observe(infer_from_samples(&first).unwrap(), &first, Utc::now());
        history.observe(infer_from_samples(&second).unwrap(), &second, Utc::now());

        assert_eq!(history.versions.len(), 2);
        assert_ne!(history.versions[0].hash, history.versions[1].hash);
    }

    #[test]
    fn history_is_bounded() {
        let mut history = SchemaEvolution::new(3);
        for i in 0..6 {
            let samples = window(vec![json!({ (format!("field{i}")): 1 })]);
            history.observe(infer_from_samples(&samples).unwrap(), &samples, Utc::now());
        }
        assert_eq!(history.versions.len(), 3);
        // Oldest entries were evicted.
        let props = history.versions[0].schema.properties.as_ref().unwrap();
        assert!(props.contains_key("field3"));
    }

    #[test]
    fn consistent_window_is_stable() {
        let samples = window(vec![
            json!({"a": 1, "b": "x"}),
            json!({"a": 2, "b": "y"}),
            json!({"a": 3, "b": "z"}),
        ]);
        let report = analyze_stability(&samples);
        assert!(report.is_stable);
        assert!(report.inconsistent_fields.is_empty());
        assert!(report.stability_confidence > 0.0);
    }

    #[test]
    fn missing_field_breaks_stability() {
        let samples = window(vec![json!({"a": 1, "b": "x"}), json!({"a": 2})]);
        let report = analyze_stability(&samples);
        assert!(!report.is_stable);
        assert_eq!(report.inconsistent_fields, vec!["b".to_string()]);
    }

    #[test]
    fn clashing_type_breaks_stability() {
        let samples = window(vec![json!({"a": 1}), json!({"a": "one"})]);
        let report = analyze_stability(&samples);
        assert!(!report.is_stable);
        assert_eq!(report.inconsistent_fields, vec!["a".to_string()]);
    }

    #[test]
    fn confidence_grows_with_samples() {
        let small = analyze_stability(&window(vec![json!({"a": 1}); 2]));
        let large = analyze_stability(&window(vec![json!({"a": 1}); 40]));
        assert!(large.stability_confidence > small.stability_confidence);
        assert!(large.stability_confidence < 1.0);
    }
}
