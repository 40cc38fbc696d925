//! Read-only accessors over a JSON-Schema-like tool input schema.
//!
//! Tool schemas arrive as raw JSON from the wire; these helpers pull out
//! the handful of fields generation cares about without committing to a
//! full JSON Schema implementation.

use serde_json::{Map, Value};

/// The declared `type` of a schema node, defaulting to `object` at the top
/// level and `string` for untyped properties.
pub fn type_of(schema: &Value) -> &str {
    schema.get("type").and_then(Value::as_str).unwrap_or("string")
}

/// Property map of an object schema, empty when absent.
pub fn properties(schema: &Value) -> Map<String, Value> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Required property names, empty when absent.
pub fn required(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Optional property names: declared but not required, in declaration order.
pub fn optional(schema: &Value) -> Vec<String> {
    let req = required(schema);
    properties(schema)
        .keys()
        .filter(|k| !req.contains(k))
        .cloned()
        .collect()
}

pub fn enum_values(schema: &Value) -> Option<Vec<Value>> {
    schema.get("enum").and_then(Value::as_array).cloned()
}

pub fn const_value(schema: &Value) -> Option<&Value> {
    schema.get("const")
}

pub fn format_of(schema: &Value) -> Option<&str> {
    schema.get("format").and_then(Value::as_str)
}

pub fn description_of(schema: &Value) -> Option<&str> {
    schema.get("description").and_then(Value::as_str)
}

pub fn examples_first(schema: &Value) -> Option<&Value> {
    schema
        .get("examples")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
}

pub fn default_value(schema: &Value) -> Option<&Value> {
    schema.get("default")
}

pub fn minimum(schema: &Value) -> Option<f64> {
    schema.get("minimum").and_then(Value::as_f64)
}

pub fn maximum(schema: &Value) -> Option<f64> {
    schema.get("maximum").and_then(Value::as_f64)
}

pub fn min_length(schema: &Value) -> Option<u64> {
    schema.get("minLength").and_then(Value::as_u64)
}

pub fn max_length(schema: &Value) -> Option<u64> {
    schema.get("maxLength").and_then(Value::as_u64)
}

pub fn min_items(schema: &Value) -> Option<u64> {
    schema.get("minItems").and_then(Value::as_u64)
}

pub fn max_items(schema: &Value) -> Option<u64> {
    schema.get("maxItems").and_then(Value::as_u64)
}

pub fn items_schema(schema: &Value) -> Option<&Value> {
    schema.get("items")
}

/// Validates that a tool input schema is usable for generation: it must be
/// an object (or omit `type`), and `properties`, when present, must be an
/// object of objects.
pub fn validate_input_schema(schema: &Value) -> Result<(), String> {
    if schema.is_null() {
        return Ok(());
    }
    if !schema.is_object() {
        return Err("input schema is not a JSON object".to_string());
    }
    if let Some(t) = schema.get("type").and_then(Value::as_str) {
        if t != "object" {
            return Err(format!("input schema declares type '{t}', expected 'object'"));
        }
    }
    if let Some(props) = schema.get("properties") {
        let map = props
            .as_object()
            .ok_or_else(|| "'properties' is not an object".to_string())?;
        for (name, prop) in map {
            if !prop.is_object() {
                return Err(format!("property '{name}' is not a schema object"));
            }
        }
    }
    Ok(())
}
