//! # Response Structure Fingerprinting
//!
//! Reduces a response value to its *shape*: types, object keys, array
//! homogeneity, and string sub-formats, with every literal value discarded.
//! Hashing the canonical form of the shape yields a short, deterministic
//! digest that two observation runs can compare without storing responses.
//!
//! Two values with the same shape always hash identically:
//!
//! ```rust
//! use bellwether_fingerprint::structure::structure_hash;
//! use serde_json::json;
//!
//! assert_eq!(
//!     structure_hash(&json!({"a": "x"})),
//!     structure_hash(&json!({"a": "y"})),
//! );
//! assert_eq!(
//!     structure_hash(&json!([1, 2, 3])),
//!     structure_hash(&json!([10, 20, 30])),
//! );
//! ```

use crate::canonical::{canonicalize, sha256_hex};
use crate::sample::{Outcome, Sample};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Maximum recursion depth when extracting a shape. Structure below this
/// depth collapses to a `deep` marker so that self-referential payloads
/// cannot run away.
const MAX_SHAPE_DEPTH: usize = 10;

/// Number of array elements sampled when judging homogeneity.
const ARRAY_SAMPLE: usize = 3;

/// Truncated hex length of a structure hash.
const STRUCTURE_HASH_LEN: usize = 16;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?)?$")
        .expect("date regex")
});
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Classified content type of a response, aggregated across samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Object,
    Array,
    Primitive,
    Empty,
    Error,
    /// Samples disagreed on the content type.
    Mixed,
}

/// Coarse size bucket by response text length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Tiny,
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Buckets a text length: tiny under 100, small under 1000, medium
    /// under 10000, large otherwise.
    pub fn classify(len: usize) -> Self {
        if len < 100 {
            SizeClass::Tiny
        } else if len < 1_000 {
            SizeClass::Small
        } else if len < 10_000 {
            SizeClass::Medium
        } else {
            SizeClass::Large
        }
    }
}

/// Aggregated structural fingerprint of a tool's responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFingerprint {
    /// Dominant structure hash across samples.
    pub structure_hash: String,

    /// Aggregated content type.
    pub content_type: ContentType,

    /// Sorted top-level keys, when the dominant response shape is an object.
    pub fields: Vec<String>,

    /// Structure hash of the first array element, when responses are arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item_structure: Option<String>,

    /// Size bucket of a typical response.
    pub size: SizeClass,

    /// Whether responses were empty.
    pub is_empty: bool,

    /// Number of samples aggregated.
    pub sample_count: usize,

    /// Share of samples that produced the dominant structure hash, 0.0-1.0.
    pub confidence: f64,
}

impl ResponseFingerprint {
    /// Fingerprint for a tool that produced no usable samples.
    pub fn empty() -> Self {
        Self {
            structure_hash: String::new(),
            content_type: ContentType::Empty,
            fields: Vec::new(),
            array_item_structure: None,
            size: SizeClass::Tiny,
            is_empty: true,
            sample_count: 0,
            confidence: 0.0,
        }
    }

    /// Aggregates a fingerprint over a tool's collected samples.
    ///
    /// Error samples contribute to the content-type vote (as `error`) but
    /// not to the structure hash; the dominant hash and its share come from
    /// successful responses only.
    pub fn from_samples(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::empty();
        }

        let mut hash_votes: HashMap<String, usize> = HashMap::new();
        let mut type_votes: Vec<ContentType> = Vec::new();
        let mut total_len = 0usize;
        let mut measured = 0usize;
        let mut first_dominant: Option<&Value> = None;

        for sample in samples {
            match (&sample.outcome, &sample.response_content) {
                (Outcome::Error, _) => type_votes.push(ContentType::Error),
                (Outcome::Success, None) => type_votes.push(ContentType::Empty),
                (Outcome::Success, Some(content)) => {
                    type_votes.push(classify_value(content));
                    let hash = structure_hash(content);
                    *hash_votes.entry(hash).or_insert(0) += 1;
                    total_len += text_length(content);
                    measured += 1;
                }
            }
        }

        // Dominant hash: highest vote count, ties broken by hash ordering so
        // the result is deterministic.
        let dominant = hash_votes
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(hash, count)| (hash.clone(), *count));

        let (structure, confidence) = match &dominant {
            Some((hash, count)) if measured > 0 => {
                (hash.clone(), *count as f64 / measured as f64)
            }
            _ => (String::new(), 0.0),
        };

        if let Some((hash, _)) = &dominant {
            first_dominant = samples.iter().find_map(|s| {
                s.response_content
                    .as_ref()
                    .filter(|content| &structure_hash(content) == hash)
            });
        }

        let content_type = aggregate_types(&type_votes);

        let fields = match first_dominant {
            Some(Value::Object(map)) => {
                let mut keys: Vec<String> = map.keys().cloned().collect();
                keys.sort();
                keys
            }
            _ => Vec::new(),
        };

        let array_item_structure = match first_dominant {
            Some(Value::Array(items)) => items.first().map(structure_hash),
            _ => None,
        };

        let is_empty = match first_dominant {
            None => true,
            Some(v) => value_is_empty(v),
        };

        let size = if measured > 0 {
            SizeClass::classify(total_len / measured)
        } else {
            SizeClass::Tiny
        };

        Self {
            structure_hash: structure,
            content_type,
            fields,
            array_item_structure,
            size,
            is_empty,
            sample_count: samples.len(),
            confidence,
        }
    }
}

/// Computes the structure hash of a value: SHA-256 over the canonical shape,
/// truncated to 16 hex characters.
pub fn structure_hash(value: &Value) -> String {
    let shape = shape_of(value, 0);
    let mut hash = sha256_hex(canonicalize(&shape).as_bytes());
    hash.truncate(STRUCTURE_HASH_LEN);
    hash
}

/// Extracts the shape of a value with all literals discarded.
///
/// Object keys are sorted by the canonical serializer; arrays sample up to
/// three elements and record whether the samples share a structure.
pub fn shape_of(value: &Value, depth: usize) -> Value {
    if depth >= MAX_SHAPE_DEPTH {
        return json!({"type": "deep"});
    }

    match value {
        Value::Null => json!({"type": "null"}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(_) => json!({"type": "number"}),
        Value::String(s) => match string_subtype(s) {
            Some(subtype) => json!({"type": "string", "subtype": subtype}),
            None => json!({"type": "string"}),
        },
        Value::Array(items) => {
            let sampled: Vec<Value> = items
                .iter()
                .take(ARRAY_SAMPLE)
                .map(|item| shape_of(item, depth + 1))
                .collect();
            let homogeneous = sampled.windows(2).all(|w| w[0] == w[1]);
            let item_shape = sampled.into_iter().next().unwrap_or(Value::Null);
            json!({
                "type": "array",
                "items": item_shape,
                "homogeneous": homogeneous,
            })
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut properties = serde_json::Map::new();
            for key in &keys {
                properties.insert((*key).clone(), shape_of(&map[*key], depth + 1));
            }
            json!({
                "type": "object",
                "keys": keys,
                "properties": Value::Object(properties),
            })
        }
    }
}

/// Detects a well-known string sub-format, if any.
fn string_subtype(s: &str) -> Option<&'static str> {
    if UUID_RE.is_match(s) {
        Some("uuid")
    } else if DATE_RE.is_match(s) {
        Some("date")
    } else if s.starts_with("http://") || s.starts_with("https://") {
        Some("url")
    } else if EMAIL_RE.is_match(s) {
        Some("email")
    } else {
        None
    }
}

fn classify_value(value: &Value) -> ContentType {
    match value {
        Value::Null => ContentType::Empty,
        Value::String(s) if s.is_empty() => ContentType::Empty,
        Value::String(_) => ContentType::Text,
        Value::Object(map) if map.is_empty() => ContentType::Empty,
        Value::Object(_) => ContentType::Object,
        Value::Array(items) if items.is_empty() => ContentType::Empty,
        Value::Array(_) => ContentType::Array,
        Value::Number(_) | Value::Bool(_) => ContentType::Primitive,
    }
}

fn aggregate_types(votes: &[ContentType]) -> ContentType {
    match votes.first() {
        None => ContentType::Empty,
        Some(first) => {
            if votes.iter().all(|t| t == first) {
                *first
            } else {
                ContentType::Mixed
            }
        }
    }
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn text_length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        other => canonicalize(other).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_ignores_literal_values() {
        assert_eq!(
            structure_hash(&json!({"a": "x"})),
            structure_hash(&json!({"a": "y"}))
        );
        assert_eq!(
            structure_hash(&json!([1, 2, 3])),
            structure_hash(&json!([10, 20, 30]))
        );
    }

    #[test]
    fn hash_is_key_order_independent() {
        assert_eq!(
            structure_hash(&json!({"a": 1, "b": "x"})),
            structure_hash(&json!({"b": "y", "a": 2}))
        );
    }

    #[test]
    fn hash_distinguishes_shapes() {
        assert_ne!(
            structure_hash(&json!({"a": 1})),
            structure_hash(&json!({"a": "1"}))
        );
        assert_ne!(structure_hash(&json!({"a": 1})), structure_hash(&json!({"b": 1})));
        assert_ne!(structure_hash(&json!([1])), structure_hash(&json!(["1"])));
    }

    #[test]
    fn hash_is_sixteen_hex_chars() {
        let h = structure_hash(&json!({"a": 1}));
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn string_subtypes_detected() {
        assert_eq!(string_subtype("2024-01-15"), Some("date"));
        assert_eq!(string_subtype("2024-01-15T10:30:00Z"), Some("date"));
        assert_eq!(
            string_subtype("123e4567-e89b-12d3-a456-426614174000"),
            Some("uuid")
        );
        assert_eq!(string_subtype("https://example.com/a"), Some("url"));
        assert_eq!(string_subtype("user@example.com"), Some("email"));
        assert_eq!(string_subtype("plain text"), None);
    }

    #[test]
    fn subtype_changes_the_hash() {
        assert_ne!(
            structure_hash(&json!({"v": "2024-01-15"})),
            structure_hash(&json!({"v": "plain"}))
        );
    }

    #[test]
    fn mixed_arrays_not_homogeneous() {
        let homo = shape_of(&json!([1, 2, 3]), 0);
        let mixed = shape_of(&json!([1, "a", true]), 0);
        assert_eq!(homo["homogeneous"], json!(true));
        assert_eq!(mixed["homogeneous"], json!(false));
    }

    #[test]
    fn deep_nesting_collapses() {
        // Build a 12-deep nesting; beyond depth 10 the shape flattens out.
        let mut value = json!("leaf");
        for _ in 0..12 {
            value = json!({"inner": value});
        }
        let shape = shape_of(&value, 0);
        let text = canonicalize(&shape);
        assert!(text.contains(r#""type":"deep""#));
    }

    #[test]
    fn size_classes() {
        assert_eq!(SizeClass::classify(0), SizeClass::Tiny);
        assert_eq!(SizeClass::classify(99), SizeClass::Tiny);
        assert_eq!(SizeClass::classify(100), SizeClass::Small);
        assert_eq!(SizeClass::classify(999), SizeClass::Small);
        assert_eq!(SizeClass::classify(1_000), SizeClass::Medium);
        assert_eq!(SizeClass::classify(10_000), SizeClass::Large);
    }

    fn success(content: Value) -> Sample {
        Sample::success("t", json!({}), 10, content)
    }

    #[test]
    fn fingerprint_dominant_hash_confidence() {
        let samples = vec![
            success(json!({"status": "ok", "temp": 72})),
            success(json!({"status": "ok", "temp": 68})),
            success(json!({"status": "ok", "temp": 70})),
            success(json!({"different": true})),
        ];
        let fp = ResponseFingerprint::from_samples(&samples);
        assert_eq!(fp.sample_count, 4);
        assert!((fp.confidence - 0.75).abs() < 1e-9);
        assert_eq!(fp.content_type, ContentType::Object);
        assert_eq!(fp.fields, vec!["status".to_string(), "temp".to_string()]);
        assert!(!fp.is_empty);
    }

    #[test]
    fn fingerprint_of_errors_only() {
        let samples = vec![
            Sample::error("t", json!({}), 3, "bad input"),
            Sample::error("t", json!({}), 4, "bad input"),
        ];
        let fp = ResponseFingerprint::from_samples(&samples);
        assert_eq!(fp.content_type, ContentType::Error);
        assert_eq!(fp.confidence, 0.0);
        assert!(fp.structure_hash.is_empty());
    }

    #[test]
    fn fingerprint_array_item_structure() {
        let samples = vec![success(json!([{"id": 1}, {"id": 2}]))];
        let fp = ResponseFingerprint::from_samples(&samples);
        assert_eq!(fp.content_type, ContentType::Array);
        assert_eq!(
            fp.array_item_structure.as_deref(),
            Some(structure_hash(&json!({"id": 5})).as_str())
        );
    }

    #[test]
    fn fingerprint_mixed_content() {
        let samples = vec![success(json!("text")), success(json!({"k": 1}))];
        let fp = ResponseFingerprint::from_samples(&samples);
        assert_eq!(fp.content_type, ContentType::Mixed);
    }

    #[test]
    fn fingerprint_no_samples() {
        let fp = ResponseFingerprint::from_samples(&[]);
        assert_eq!(fp.sample_count, 0);
        assert!(fp.is_empty);
    }
}
