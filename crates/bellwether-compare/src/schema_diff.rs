//! # Input Schema Comparison
//!
//! Walks two versions of a tool's input schema and grades every difference.
//! The rules follow the consumer's point of view: anything that can reject
//! a previously valid call (removals, narrowing, new requirements, tighter
//! constraints) is breaking; anything purely additive or loosening is
//! informational.

use crate::severity::Severity;
use serde_json::Value;
use std::collections::HashMap;

/// One graded difference between two schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFinding {
    pub description: String,
    pub severity: Severity,
}

impl SchemaFinding {
    fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            description: description.into(),
            severity,
        }
    }
}

/// Compares two input schemas, returning every graded difference.
pub fn compare_input_schemas(old: &Value, new: &Value) -> Vec<SchemaFinding> {
    let mut findings = Vec::new();

    if old == new {
        return findings;
    }

    let old_type = type_of(old);
    let new_type = type_of(new);
    if old_type != new_type {
        findings.push(SchemaFinding::new(
            format!("schema type changed: '{old_type}' -> '{new_type}'"),
            Severity::Breaking,
        ));
        return findings;
    }

    let old_props = properties_of(old);
    let new_props = properties_of(new);
    let old_required = required_of(old);
    let new_required = required_of(new);

    // Removals reject calls that used to pass.
    for name in old_props.keys() {
        if !new_props.contains_key(name) {
            findings.push(SchemaFinding::new(
                format!("property '{name}' removed"),
                Severity::Breaking,
            ));
        }
    }

    for name in new_props.keys() {
        if !old_props.contains_key(name) {
            if new_required.contains(name) {
                findings.push(SchemaFinding::new(
                    format!("new required property '{name}' added"),
                    Severity::Breaking,
                ));
            } else {
                findings.push(SchemaFinding::new(
                    format!("new optional property '{name}' added"),
                    Severity::Info,
                ));
            }
        }
    }

    // Requirement transitions on surviving properties.
    for name in &new_required {
        if !old_required.contains(name) && old_props.contains_key(name) {
            findings.push(SchemaFinding::new(
                format!("property '{name}' is now required"),
                Severity::Breaking,
            ));
        }
    }
    for name in &old_required {
        if !new_required.contains(name) && new_props.contains_key(name) {
            findings.push(SchemaFinding::new(
                format!("property '{name}' is no longer required"),
                Severity::Info,
            ));
        }
    }

    // Property-level drift.
    for (name, old_prop) in &old_props {
        let new_prop = match new_props.get(name) {
            Some(p) => p,
            None => continue,
        };
        if old_prop == new_prop {
            continue;
        }
        findings.extend(compare_property(name, old_prop, new_prop));
    }

    if findings.is_empty() {
        // The schemas differ somewhere this walk does not model.
        findings.push(SchemaFinding::new("schema modified", Severity::Info));
    }

    findings
}

fn compare_property(name: &str, old: &Value, new: &Value) -> Vec<SchemaFinding> {
    let mut findings = Vec::new();

    let old_type = type_of(old);
    let new_type = type_of(new);
    if old_type != new_type {
        findings.push(SchemaFinding::new(
            format!("property '{name}' type changed: '{old_type}' -> '{new_type}'"),
            Severity::Breaking,
        ));
        return findings;
    }

    // Enum membership: removals break callers, additions do not.
    match (enum_of(old), enum_of(new)) {
        (Some(old_enum), Some(new_enum)) => {
            for value in &old_enum {
                if !new_enum.contains(value) {
                    findings.push(SchemaFinding::new(
                        format!("property '{name}': enum value {value} removed"),
                        Severity::Breaking,
                    ));
                }
            }
            for value in &new_enum {
                if !old_enum.contains(value) {
                    findings.push(SchemaFinding::new(
                        format!("property '{name}': enum value {value} added"),
                        Severity::Info,
                    ));
                }
            }
        }
        (None, Some(_)) => {
            findings.push(SchemaFinding::new(
                format!("property '{name}': values restricted to an enum"),
                Severity::Breaking,
            ));
        }
        (Some(_), None) => {
            findings.push(SchemaFinding::new(
                format!("property '{name}': enum restriction lifted"),
                Severity::Info,
            ));
        }
        (None, None) => {}
    }

    // Numeric and length constraints: tightening breaks, loosening informs.
    constraint_shift(&mut findings, name, old, new, "minimum", Direction::HigherTightens);
    constraint_shift(&mut findings, name, old, new, "maximum", Direction::LowerTightens);
    constraint_shift(&mut findings, name, old, new, "minLength", Direction::HigherTightens);
    constraint_shift(&mut findings, name, old, new, "maxLength", Direction::LowerTightens);
    constraint_shift(&mut findings, name, old, new, "minItems", Direction::HigherTightens);
    constraint_shift(&mut findings, name, old, new, "maxItems", Direction::LowerTightens);

    if findings.is_empty() {
        let description_changed = old.get("description") != new.get("description");
        if description_changed {
            findings.push(SchemaFinding::new(
                format!("property '{name}': description changed"),
                Severity::Info,
            ));
        } else {
            findings.push(SchemaFinding::new(
                format!("property '{name}' modified"),
                Severity::Info,
            ));
        }
    }

    findings
}

enum Direction {
    /// A larger value narrows what the server accepts (minimum, minLength).
    HigherTightens,
    /// A smaller value narrows what the server accepts (maximum, maxLength).
    LowerTightens,
}

fn constraint_shift(
    findings: &mut Vec<SchemaFinding>,
    name: &str,
    old: &Value,
    new: &Value,
    key: &str,
    direction: Direction,
) {
    let old_value = old.get(key).and_then(Value::as_f64);
    let new_value = new.get(key).and_then(Value::as_f64);

    let (tightened, changed) = match (old_value, new_value) {
        (Some(a), Some(b)) if a != b => {
            let tightened = match direction {
                Direction::HigherTightens => b > a,
                Direction::LowerTightens => b < a,
            };
            (tightened, true)
        }
        // A constraint appearing out of nowhere narrows the surface; one
        // disappearing widens it.
        (None, Some(_)) => (true, true),
        (Some(_), None) => (false, true),
        _ => (false, false),
    };

    if !changed {
        return;
    }
    if tightened {
        findings.push(SchemaFinding::new(
            format!("property '{name}': constraint '{key}' tightened"),
            Severity::Breaking,
        ));
    } else {
        findings.push(SchemaFinding::new(
            format!("property '{name}': constraint '{key}' loosened"),
            Severity::Info,
        ));
    }
}

fn type_of(schema: &Value) -> String {
    schema
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn properties_of(schema: &Value) -> HashMap<String, Value> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn required_of(schema: &Value) -> Vec<String> {
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

fn enum_of(schema: &Value) -> Option<Vec<Value>> {
    schema.get("enum").and_then(Value::as_array).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn max_severity(findings: &[SchemaFinding]) -> Severity {
        findings.iter().map(|f| f.severity).max().unwrap_or_default()
    }

    #[test]
    fn identical_schemas_yield_nothing() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert!(compare_input_schemas(&schema, &schema).is_empty());
    }

    #[test]
    fn new_required_property_is_breaking() {
        let old = json!({
            "type": "object",
            "properties": {"username": {"type": "string"}},
            "required": ["username"]
        });
        let new = json!({
            "type": "object",
            "properties": {
                "username": {"type": "string"},
                "age": {"type": "integer"}
            },
            "required": ["username", "age"]
        });
        let findings = compare_input_schemas(&old, &new);
        assert_eq!(max_severity(&findings), Severity::Breaking);
        assert!(findings.iter().any(|f| f.description.contains("age")));
    }

    #[test]
    fn new_optional_property_is_info() {
        let old = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let new = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}}
        });
        let findings = compare_input_schemas(&old, &new);
        assert_eq!(max_severity(&findings), Severity::Info);
    }

    #[test]
    fn property_removal_is_breaking() {
        let old = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}}
        });
        let new = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert_eq!(max_severity(&compare_input_schemas(&old, &new)), Severity::Breaking);
    }

    #[test]
    fn type_narrowing_is_breaking() {
        let old = json!({"type": "object", "properties": {"n": {"type": "number"}}});
        let new = json!({"type": "object", "properties": {"n": {"type": "string"}}});
        assert_eq!(max_severity(&compare_input_schemas(&old, &new)), Severity::Breaking);
    }

    #[test]
    fn enum_value_removal_is_breaking_addition_is_info() {
        let old = json!({"type": "object", "properties": {"s": {"type": "string", "enum": ["a", "b"]}}});
        let shrunk = json!({"type": "object", "properties": {"s": {"type": "string", "enum": ["a"]}}});
        let grown = json!({"type": "object", "properties": {"s": {"type": "string", "enum": ["a", "b", "c"]}}});

        assert_eq!(max_severity(&compare_input_schemas(&old, &shrunk)), Severity::Breaking);
        assert_eq!(max_severity(&compare_input_schemas(&old, &grown)), Severity::Info);
    }

    #[test]
    fn tightened_constraint_is_breaking_loosened_is_info() {
        let old = json!({"type": "object", "properties": {"q": {"type": "string", "maxLength": 100}}});
        let tightened = json!({"type": "object", "properties": {"q": {"type": "string", "maxLength": 10}}});
        let loosened = json!({"type": "object", "properties": {"q": {"type": "string", "maxLength": 500}}});

        assert_eq!(max_severity(&compare_input_schemas(&old, &tightened)), Severity::Breaking);
        assert_eq!(max_severity(&compare_input_schemas(&old, &loosened)), Severity::Info);
    }

    #[test]
    fn requirement_dropped_is_info() {
        let old = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "required": ["a"]
        });
        let new = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert_eq!(max_severity(&compare_input_schemas(&old, &new)), Severity::Info);
    }

    #[test]
    fn description_only_change_is_info() {
        let old = json!({"type": "object", "properties": {"a": {"type": "string", "description": "old"}}});
        let new = json!({"type": "object", "properties": {"a": {"type": "string", "description": "new"}}});
        let findings = compare_input_schemas(&old, &new);
        assert_eq!(max_severity(&findings), Severity::Info);
        assert!(findings[0].description.contains("description"));
    }
}
