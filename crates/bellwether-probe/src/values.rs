//! # Smart Value Generation
//!
//! Produces a plausible value for one parameter. The priority chain, most
//! specific source first:
//!
//! 1. fixture exact match, 2. fixture pattern match, 3. `examples[0]`,
//! 4. `default`, 5. `enum[0]`, 6. `const`, 7. `format`, 8. description
//! hints, 9. property-name heuristics, 10. constraint-aware defaults,
//! 11. plain type fallback.
//!
//! The chain is deterministic: the same parameter always yields the same
//! value, which keeps generated batteries reproducible across runs.

use crate::config::TestFixtures;
use crate::schema;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static DATE_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)YYYY-MM-DD").unwrap());
static ISO_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ISO.?8601").unwrap());
static COMMA_HINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)comma.separated").unwrap());

/// Semantic flavor a parameter advertises through its name, description,
/// or `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticKind {
    Date,
    Email,
    Url,
    Uuid,
    Ip,
    Latitude,
    Longitude,
    Pagination,
    Currency,
    Percentage,
}

/// Produces a valid-looking value for a parameter.
pub fn smart_value(name: &str, prop: &Value, fixtures: &TestFixtures) -> Value {
    if let Some(v) = fixtures.lookup(name) {
        return v.clone();
    }
    if let Some(v) = schema::examples_first(prop) {
        return v.clone();
    }
    if let Some(v) = schema::default_value(prop) {
        return v.clone();
    }
    if let Some(values) = schema::enum_values(prop) {
        if let Some(first) = values.first() {
            return first.clone();
        }
    }
    if let Some(v) = schema::const_value(prop) {
        return v.clone();
    }
    if let Some(v) = format_value(schema::format_of(prop)) {
        return v;
    }
    if let Some(v) = description_hint_value(schema::description_of(prop)) {
        return v;
    }
    if let Some(v) = name_heuristic_value(name, schema::type_of(prop)) {
        return v;
    }
    constrained_value(name, prop, fixtures)
}

fn format_value(format: Option<&str>) -> Option<Value> {
    Some(match format? {
        "date" => json!("2024-01-15"),
        "date-time" => json!("2024-01-15T10:30:00Z"),
        "time" => json!("10:30:00"),
        "email" => json!("user@example.com"),
        "uri" | "url" => json!("https://example.com/resource"),
        "uuid" => json!("123e4567-e89b-12d3-a456-426614174000"),
        "ipv4" => json!("192.168.1.10"),
        _ => return None,
    })
}

fn description_hint_value(description: Option<&str>) -> Option<Value> {
    let text = description?;
    if DATE_HINT.is_match(text) {
        return Some(json!("2024-01-15"));
    }
    if ISO_HINT.is_match(text) {
        return Some(json!("2024-01-15T10:30:00Z"));
    }
    if COMMA_HINT.is_match(text) {
        return Some(json!("alpha,beta,gamma"));
    }
    None
}

fn name_heuristic_value(name: &str, prop_type: &str) -> Option<Value> {
    if prop_type != "string" {
        return None;
    }
    let lowered = name.to_lowercase();
    if lowered.contains("email") {
        return Some(json!("user@example.com"));
    }
    if lowered.contains("url") || lowered.contains("uri") || lowered.contains("link") {
        return Some(json!("https://example.com/resource"));
    }
    if lowered.contains("uuid") || lowered.ends_with("_id") || lowered == "id" {
        return Some(json!("123e4567-e89b-12d3-a456-426614174000"));
    }
    if lowered.contains("date") {
        return Some(json!("2024-01-15"));
    }
    if lowered.contains("time") {
        return Some(json!("2024-01-15T10:30:00Z"));
    }
    if lowered.contains("path") || lowered.contains("file") {
        return Some(json!("/tmp/example.txt"));
    }
    if lowered.contains("name") {
        return Some(json!("example"));
    }
    if lowered.contains("city") {
        return Some(json!("Oslo"));
    }
    if lowered.contains("country") {
        return Some(json!("Norway"));
    }
    if lowered.contains("lang") {
        return Some(json!("en"));
    }
    None
}

/// Constraint-aware defaults, then plain type fallbacks.
fn constrained_value(name: &str, prop: &Value, fixtures: &TestFixtures) -> Value {
    match schema::type_of(prop) {
        "integer" => {
            let v = midpoint(schema::minimum(prop), schema::maximum(prop), 7.0);
            json!(v.round() as i64)
        }
        "number" => {
            let v = midpoint(schema::minimum(prop), schema::maximum(prop), 42.0);
            json!(v)
        }
        "boolean" => json!(true),
        "array" => {
            let item = schema::items_schema(prop)
                .map(|items| smart_value(name, items, fixtures))
                .unwrap_or_else(|| json!("item"));
            let count = schema::min_items(prop).unwrap_or(1).max(1);
            Value::Array((0..count).map(|_| item.clone()).collect())
        }
        "object" => {
            // Populate one level of nested properties; deeper nesting gets
            // an empty object.
            let mut map = serde_json::Map::new();
            for (key, nested) in schema::properties(prop) {
                if schema::required(prop).contains(&key) {
                    map.insert(key.clone(), smart_value(&key, &nested, fixtures));
                }
            }
            Value::Object(map)
        }
        _ => {
            let min_len = schema::min_length(prop).unwrap_or(0) as usize;
            let base = "test-value";
            if base.len() >= min_len {
                json!(base)
            } else {
                // Pad to the minimum length.
                let mut s = String::from(base);
                while s.len() < min_len {
                    s.push('x');
                }
                json!(s)
            }
        }
    }
}

fn midpoint(min: Option<f64>, max: Option<f64>, fallback: f64) -> f64 {
    match (min, max) {
        (Some(lo), Some(hi)) => (lo + hi) / 2.0,
        (Some(lo), None) => lo + 1.0,
        (None, Some(hi)) => hi - 1.0,
        (None, None) => fallback,
    }
}

/// A value of a deliberately wrong primitive type.
pub fn wrong_type_value(prop_type: &str) -> Value {
    match prop_type {
        "string" => json!(12345),
        "integer" | "number" => json!("not-a-number"),
        "boolean" => json!("yes"),
        "array" => json!("not-an-array"),
        "object" => json!("not-an-object"),
        _ => json!(null),
    }
}

/// Detects the semantic flavor of a parameter, if any.
pub fn semantic_kind(name: &str, prop: &Value) -> Option<SemanticKind> {
    match schema::format_of(prop) {
        Some("date") | Some("date-time") => return Some(SemanticKind::Date),
        Some("email") => return Some(SemanticKind::Email),
        Some("uri") | Some("url") => return Some(SemanticKind::Url),
        Some("uuid") => return Some(SemanticKind::Uuid),
        Some("ipv4") | Some("ipv6") => return Some(SemanticKind::Ip),
        _ => {}
    }

    let mut haystack = name.to_lowercase();
    if let Some(desc) = schema::description_of(prop) {
        haystack.push(' ');
        haystack.push_str(&desc.to_lowercase());
    }

    if haystack.contains("email") {
        Some(SemanticKind::Email)
    } else if haystack.contains("url") || haystack.contains("uri") {
        Some(SemanticKind::Url)
    } else if haystack.contains("uuid") {
        Some(SemanticKind::Uuid)
    } else if haystack.contains("date") || haystack.contains("timestamp") {
        Some(SemanticKind::Date)
    } else if haystack.contains("ip address") || haystack.contains("ipv4") {
        Some(SemanticKind::Ip)
    } else if haystack.contains("latitude") {
        Some(SemanticKind::Latitude)
    } else if haystack.contains("longitude") {
        Some(SemanticKind::Longitude)
    } else if haystack.contains("page") || haystack.contains("offset") || haystack.contains("cursor")
    {
        Some(SemanticKind::Pagination)
    } else if haystack.contains("currency") {
        Some(SemanticKind::Currency)
    } else if haystack.contains("percent") {
        Some(SemanticKind::Percentage)
    } else {
        None
    }
}

/// An invalid value for a semantic flavor.
pub fn semantic_invalid_value(kind: SemanticKind) -> Value {
    match kind {
        SemanticKind::Date => json!("not-a-date"),
        SemanticKind::Email => json!("not-an-email"),
        SemanticKind::Url => json!("not a url"),
        SemanticKind::Uuid => json!("not-a-uuid"),
        SemanticKind::Ip => json!("999.999.999.999"),
        SemanticKind::Latitude => json!(1234.5),
        SemanticKind::Longitude => json!(-1234.5),
        SemanticKind::Pagination => json!(-1),
        SemanticKind::Currency => json!("NOT_A_CURRENCY"),
        SemanticKind::Percentage => json!(250),
    }
}
