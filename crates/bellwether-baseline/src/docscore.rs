//! Documentation scoring.
//!
//! A deterministic 0-100 score of how well a server documents its surface:
//! tool descriptions (weight 50), per-parameter descriptions (30), and
//! extras like titles or schema examples (20). The score is a property of
//! the advertised descriptors only; runtime evidence does not move it.

use crate::model::ToolRecord;
use serde_json::Value;

/// Scores the documentation quality of a tool surface.
///
/// Returns `None` when there are no tools to score.
pub fn documentation_score(tools: &[ToolRecord]) -> Option<u32> {
    if tools.is_empty() {
        return None;
    }

    let total = tools.len() as f64;

    let described = tools
        .iter()
        .filter(|t| t.descriptor.description.trim().len() >= 10)
        .count() as f64;

    let params_described = tools
        .iter()
        .filter(|t| parameters_documented(&t.descriptor.input_schema))
        .count() as f64;

    let extras = tools
        .iter()
        .filter(|t| t.descriptor.title.is_some() || has_examples(&t.descriptor.input_schema))
        .count() as f64;

    let score = 50.0 * (described / total) + 30.0 * (params_described / total)
        + 20.0 * (extras / total);
    Some(score.round() as u32)
}

/// True when every declared parameter carries a description.
fn parameters_documented(schema: &Value) -> bool {
    let properties = match schema.get("properties").and_then(Value::as_object) {
        Some(p) if !p.is_empty() => p,
        // No parameters means nothing is undocumented.
        Some(_) => return true,
        None => return true,
    };
    properties.values().all(|prop| {
        prop.get("description")
            .and_then(Value::as_str)
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    })
}

fn has_examples(schema: &Value) -> bool {
    if schema.get("examples").is_some() {
        return true;
    }
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.values().any(|p| p.get("examples").is_some()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolDescriptor;
    use serde_json::json;

    fn record(description: &str, schema: Value) -> ToolRecord {
        ToolRecord::from_descriptor(ToolDescriptor::new("t", description, schema))
    }

    #[test]
    fn empty_surface_has_no_score() {
        assert!(documentation_score(&[]).is_none());
    }

    #[test]
    fn fully_documented_scores_high() {
        let tools = vec![record(
            "Returns the current weather for a city",
            json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "City name", "examples": ["Oslo"]}
                }
            }),
        )];
        let score = documentation_score(&tools).unwrap();
        assert_eq!(score, 100);
    }

    #[test]
    fn undocumented_scores_low() {
        let tools = vec![record(
            "",
            json!({
                "type": "object",
                "properties": {"q": {"type": "string"}}
            }),
        )];
        let score = documentation_score(&tools).unwrap();
        assert!(score < 40, "got {score}");
    }

    #[test]
    fn score_is_monotone_in_coverage() {
        let documented = record(
            "Reads a file from the workspace",
            json!({
                "type": "object",
                "properties": {"path": {"type": "string", "description": "File path"}}
            }),
        );
        let bare = record("", json!({"type": "object", "properties": {"p": {"type": "string"}}}));

        let full = documentation_score(&[documented.clone()]).unwrap();
        let half = documentation_score(&[documented, bare]).unwrap();
        assert!(full > half);
    }
}
