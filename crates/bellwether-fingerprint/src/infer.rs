//! # Response Schema Inference
//!
//! Derives a JSON-Schema-like description of a tool's responses from the
//! values it actually returned, then merges the per-sample schemas into one.
//!
//! ## Merge rules
//!
//! - Object properties are unioned; a property stays `required` only when it
//!   was present and non-null in *every* sample that carried the parent
//!   object.
//! - `integer ∪ number` widens to `number`.
//! - `null ∪ T` yields `T` with `nullable = true`.
//! - Incompatible types collapse to `mixed`.
//! - Extraction and merging are both depth-capped; structure deeper than the
//!   cap becomes `{"type": "deep"}` so cyclic payloads terminate.
//!
//! Merging is associative, commutative up to property ordering, and
//! idempotent; the property tests below pin all three.

use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum depth for schema extraction and merging.
const MAX_INFER_DEPTH: usize = 10;

/// A schema inferred from observed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredSchema {
    /// One of `object`, `array`, `string`, `number`, `integer`, `boolean`,
    /// `null`, `mixed`, or `deep`.
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Property schemas, for objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, InferredSchema>>,

    /// Element schema, for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<InferredSchema>>,

    /// Properties that were non-null in every observed parent object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    /// Whether a null was observed alongside this type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    /// Closed value set, when known.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl InferredSchema {
    /// A bare schema of the given type.
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: schema_type.into(),
            properties: None,
            items: None,
            required: None,
            nullable: None,
            enum_values: None,
        }
    }

    fn with_nullable(mut self, nullable: bool) -> Self {
        if nullable {
            self.nullable = Some(true);
        }
        self
    }
}

/// Infers the schema of a single value.
pub fn infer_value(value: &Value) -> InferredSchema {
    infer_at(value, 0)
}

fn infer_at(value: &Value, depth: usize) -> InferredSchema {
    if depth >= MAX_INFER_DEPTH {
        return InferredSchema::of_type("deep");
    }

    match value {
        Value::Null => InferredSchema::of_type("null"),
        Value::Bool(_) => InferredSchema::of_type("boolean"),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                InferredSchema::of_type("integer")
            } else {
                InferredSchema::of_type("number")
            }
        }
        Value::String(_) => InferredSchema::of_type("string"),
        Value::Array(items) => {
            let mut merged: Option<InferredSchema> = None;
            for item in items {
                let schema = infer_at(item, depth + 1);
                merged = Some(match merged {
                    None => schema,
                    Some(prev) => merge_at(&prev, &schema, depth + 1),
                });
            }
            let mut out = InferredSchema::of_type("array");
            out.items = merged.map(Box::new);
            out
        }
        Value::Object(map) => {
            let mut properties = BTreeMap::new();
            let mut required = Vec::new();
            for (key, val) in map {
                properties.insert(key.clone(), infer_at(val, depth + 1));
                if !val.is_null() {
                    required.push(key.clone());
                }
            }
            required.sort();
            let mut out = InferredSchema::of_type("object");
            out.properties = Some(properties);
            out.required = Some(required);
            out
        }
    }
}

/// Merges two inferred schemas.
pub fn merge_schemas(a: &InferredSchema, b: &InferredSchema) -> InferredSchema {
    merge_at(a, b, 0)
}

fn merge_at(a: &InferredSchema, b: &InferredSchema, depth: usize) -> InferredSchema {
    if depth >= MAX_INFER_DEPTH {
        return InferredSchema::of_type("deep");
    }

    let nullable = a.nullable.unwrap_or(false) || b.nullable.unwrap_or(false);

    // Null widens the other side instead of conflicting with it.
    if a.schema_type == "null" && b.schema_type == "null" {
        return InferredSchema::of_type("null").with_nullable(nullable);
    }
    if a.schema_type == "null" {
        return b.clone().with_nullable(true);
    }
    if b.schema_type == "null" {
        return a.clone().with_nullable(true);
    }

    if a.schema_type != b.schema_type {
        let numeric = ["integer", "number"];
        if numeric.contains(&a.schema_type.as_str()) && numeric.contains(&b.schema_type.as_str()) {
            return InferredSchema::of_type("number").with_nullable(nullable);
        }
        return InferredSchema::of_type("mixed").with_nullable(nullable);
    }

    let mut out = InferredSchema::of_type(a.schema_type.clone()).with_nullable(nullable);

    match a.schema_type.as_str() {
        "object" => {
            let empty = BTreeMap::new();
            let props_a = a.properties.as_ref().unwrap_or(&empty);
            let props_b = b.properties.as_ref().unwrap_or(&empty);

            let mut merged = BTreeMap::new();
            for (key, schema_a) in props_a {
                match props_b.get(key) {
                    Some(schema_b) => {
                        merged.insert(key.clone(), merge_at(schema_a, schema_b, depth + 1));
                    }
                    None => {
                        merged.insert(key.clone(), schema_a.clone());
                    }
                }
            }
            for (key, schema_b) in props_b {
                merged
                    .entry(key.clone())
                    .or_insert_with(|| schema_b.clone());
            }
            out.properties = Some(merged);

            // Required survives only where both sides agree.
            let req_a = a.required.clone().unwrap_or_default();
            let req_b = b.required.clone().unwrap_or_default();
            let mut required: Vec<String> =
                req_a.into_iter().filter(|k| req_b.contains(k)).collect();
            required.sort();
            out.required = Some(required);
        }
        "array" => {
            out.items = match (&a.items, &b.items) {
                (Some(ia), Some(ib)) => Some(Box::new(merge_at(ia, ib, depth + 1))),
                (Some(ia), None) => Some(ia.clone()),
                (None, Some(ib)) => Some(ib.clone()),
                (None, None) => None,
            };
        }
        _ => {}
    }

    // A closed value set survives a merge as the union of both sides.
    out.enum_values = match (&a.enum_values, &b.enum_values) {
        (Some(ea), Some(eb)) => {
            let mut union = ea.clone();
            for v in eb {
                if !union.contains(v) {
                    union.push(v.clone());
                }
            }
            union.sort_by_key(|v| crate::canonical::canonicalize(v));
            Some(union)
        }
        _ => None,
    };

    out
}

/// Infers one merged schema over all successful samples of a tool.
///
/// Returns `None` when no sample carried response content.
pub fn infer_from_samples(samples: &[Sample]) -> Option<InferredSchema> {
    let mut merged: Option<InferredSchema> = None;
    for sample in samples {
        let content = match &sample.response_content {
            Some(c) => c,
            None => continue,
        };
        let schema = infer_value(content);
        merged = Some(match merged {
            None => schema,
            Some(prev) => merge_schemas(&prev, &schema),
        });
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_inference() {
        assert_eq!(infer_value(&json!(true)).schema_type, "boolean");
        assert_eq!(infer_value(&json!(3)).schema_type, "integer");
        assert_eq!(infer_value(&json!(3.5)).schema_type, "number");
        assert_eq!(infer_value(&json!("s")).schema_type, "string");
        assert_eq!(infer_value(&json!(null)).schema_type, "null");
    }

    #[test]
    fn object_inference_marks_non_null_required() {
        let schema = infer_value(&json!({"a": 1, "b": null}));
        assert_eq!(schema.schema_type, "object");
        assert_eq!(schema.required.as_deref(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn merge_is_commutative() {
        let a = infer_value(&json!({"x": 1, "y": "s"}));
        let b = infer_value(&json!({"x": 2.5, "z": true}));
        assert_eq!(merge_schemas(&a, &b), merge_schemas(&b, &a));
    }

    #[test]
    fn merge_is_idempotent() {
        let a = infer_value(&json!({"x": 1, "y": [1, 2], "z": {"k": "v"}}));
        assert_eq!(merge_schemas(&a, &a), a);
    }

    #[test]
    fn merge_is_associative() {
        let a = infer_value(&json!({"x": 1}));
        let b = infer_value(&json!({"x": 2.5, "y": "s"}));
        let c = infer_value(&json!({"y": null, "z": true}));
        let left = merge_schemas(&merge_schemas(&a, &b), &c);
        let right = merge_schemas(&a, &merge_schemas(&b, &c));
        assert_eq!(left, right);
    }

    #[test]
    fn integer_and_number_widen() {
        let merged = merge_schemas(&infer_value(&json!(1)), &infer_value(&json!(1.5)));
        assert_eq!(merged.schema_type, "number");
    }

    #[test]
    fn null_makes_nullable() {
        let merged = merge_schemas(&infer_value(&json!(null)), &infer_value(&json!("s")));
        assert_eq!(merged.schema_type, "string");
        assert_eq!(merged.nullable, Some(true));
    }

    #[test]
    fn incompatible_types_go_mixed() {
        let merged = merge_schemas(&infer_value(&json!("s")), &infer_value(&json!(true)));
        assert_eq!(merged.schema_type, "mixed");
    }

    #[test]
    fn required_is_intersection_of_presence() {
        // "a" is non-null everywhere; "b" is null once; "c" is absent once.
        let samples = vec![
            Sample::success("t", json!({}), 1, json!({"a": 1, "b": 2, "c": 3})),
            Sample::success("t", json!({}), 1, json!({"a": 2, "b": null, "c": 4})),
            Sample::success("t", json!({}), 1, json!({"a": 3, "b": 5})),
        ];
        let schema = infer_from_samples(&samples).unwrap();
        assert_eq!(schema.required.as_deref(), Some(&["a".to_string()][..]));
        let props = schema.properties.unwrap();
        assert!(props.contains_key("b"));
        assert!(props.contains_key("c"));
    }

    #[test]
    fn array_items_merge_across_elements() {
        let schema = infer_value(&json!([1, 2.5]));
        assert_eq!(schema.items.unwrap().schema_type, "number");
    }

    #[test]
    fn deep_nesting_collapses() {
        let mut value = json!(1);
        for _ in 0..12 {
            value = json!({"inner": value});
        }
        let mut schema = infer_value(&value);
        let mut depth = 0;
        while let Some(props) = schema.properties.clone() {
            schema = props.get("inner").cloned().unwrap();
            depth += 1;
        }
        assert_eq!(schema.schema_type, "deep");
        assert!(depth <= 10, "extraction must cap at depth 10, got {depth}");
    }

    #[test]
    fn no_content_yields_none() {
        let samples = vec![Sample::error("t", json!({}), 1, "nope")];
        assert!(infer_from_samples(&samples).is_none());
    }
}
