//! Baseline assembly.
//!
//! Folds a finished [`InterviewResult`](crate::InterviewResult) into a
//! sealed baseline. The result is a single consistent snapshot: every
//! per-tool record was finalized before this runs, and sealing computes the
//! summary and integrity hash last.

use crate::engine::InterviewResult;
use bellwether_baseline::{
    documentation_score, seal, Baseline, BaselineMetadata, Capabilities, FORMAT_VERSION,
};
use chrono::Utc;

/// Builds and seals a baseline from an interview.
pub fn create_baseline(
    result: &InterviewResult,
    server_command: &str,
) -> bellwether_baseline::Result<Baseline> {
    let baseline = Baseline {
        schema_version: FORMAT_VERSION,
        metadata: BaselineMetadata {
            mode: "interview".to_string(),
            generated_at: Utc::now(),
            cli_version: env!("CARGO_PKG_VERSION").to_string(),
            server_command: server_command.to_string(),
            duration_ms: result.duration_ms,
            personas: result.personas.clone(),
            model: None,
            partial: result.partial,
            warnings: result.warnings.clone(),
        },
        server: result.server.clone(),
        capabilities: Capabilities {
            tools: result.tools.clone(),
            prompts: result.prompts.clone(),
            resources: result.resources.clone(),
            resource_templates: result.resource_templates.clone(),
        },
        workflows: None,
        documentation_score: documentation_score(&result.tools),
        summary: String::new(),
        integrity_hash: String::new(),
    };
    seal(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bellwether_baseline::{ServerInfo, ToolDescriptor, ToolRecord};
    use serde_json::json;

    fn result_with_one_tool() -> InterviewResult {
        let descriptor = ToolDescriptor::new(
            "echo",
            "Echoes its input back",
            json!({"type": "object", "properties": {"text": {"type": "string"}}}),
        );
        InterviewResult {
            run_id: "run-1".to_string(),
            server: ServerInfo {
                name: "echo-server".to_string(),
                version: "0.2.0".to_string(),
                protocol_version: "2025-06-18".to_string(),
                capabilities: vec!["tools".to_string()],
            },
            tools: vec![ToolRecord::from_descriptor(descriptor)],
            prompts: Vec::new(),
            resources: Vec::new(),
            resource_templates: Vec::new(),
            personas: vec!["careful".to_string()],
            warnings: vec!["one warning".to_string()],
            partial: false,
            duration_ms: 1500,
        }
    }

    #[test]
    fn baseline_is_sealed_and_complete() {
        let baseline = create_baseline(&result_with_one_tool(), "echo-server --stdio").unwrap();
        assert_eq!(baseline.schema_version, FORMAT_VERSION);
        assert_eq!(baseline.capabilities.tools.len(), 1);
        assert_eq!(baseline.metadata.server_command, "echo-server --stdio");
        assert_eq!(baseline.metadata.warnings.len(), 1);
        assert!(!baseline.summary.is_empty());
        assert_eq!(baseline.integrity_hash.len(), 64);
        bellwether_baseline::verify(&baseline).unwrap();
    }

    #[test]
    fn partial_flag_flows_into_metadata() {
        let mut result = result_with_one_tool();
        result.partial = true;
        let baseline = create_baseline(&result, "cmd").unwrap();
        assert!(baseline.metadata.partial);
        assert!(baseline.summary.contains("[partial]"));
    }
}
