//! # Baseline Data Model
//!
//! The baseline is the canonical record of everything observed about a tool
//! server at one point in time: the advertised surface (tools, prompts,
//! resources), the runtime evidence gathered by probing (fingerprints,
//! latency, error patterns, schema history), and the metadata needed to
//! interpret it later. Its serialized form is the contract; two baselines
//! are compared purely through these types.
//!
//! A baseline exclusively owns its entities. The comparator reads two
//! immutable baselines and produces a fresh diff; nothing here is mutated
//! after synthesis.

use bellwether_fingerprint::canonical::hash_canonical;
use bellwether_fingerprint::{
    ErrorPattern, InferredSchema, PerformanceMetrics, ResponseFingerprint, SchemaEvolution,
    SecurityFingerprint,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current on-disk format version.
pub const FORMAT_VERSION: u64 = 2;

/// Conventional baseline filename.
pub const DEFAULT_BASELINE_FILENAME: &str = "bellwether-baseline.json";

/// Behavior hints a server may attach to a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

/// Static description of one tool, as advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: String,

    pub input_schema: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Value>,

    /// Stable hash of the canonicalized input schema.
    pub schema_hash: String,
}

impl ToolDescriptor {
    /// Builds a descriptor, computing the schema hash from the canonical
    /// form of the input schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        let schema_hash = hash_canonical(&input_schema);
        Self {
            name: name.into(),
            title: None,
            description: description.into(),
            input_schema,
            output_schema: None,
            annotations: None,
            execution: None,
            schema_hash,
        }
    }

    /// True unless the server explicitly marked the tool non-idempotent.
    pub fn is_idempotent(&self) -> bool {
        self.annotations
            .as_ref()
            .and_then(|a| a.idempotent_hint)
            .unwrap_or(true)
    }
}

/// Pass-rate of expectation checks for one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAssessment {
    /// Cases whose outcome matched the expectation.
    pub passed: usize,
    /// Cases executed.
    pub total: usize,
    /// Per-persona pass counts, keyed by persona id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_persona: Vec<PersonaPassRate>,
}

/// Pass-rate of one persona against one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaPassRate {
    pub persona: String,
    pub passed: usize,
    pub total: usize,
}

/// Everything observed about one tool: the descriptor plus runtime evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    #[serde(flatten)]
    pub descriptor: ToolDescriptor,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_fingerprint: Option<ResponseFingerprint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_patterns: Vec<ErrorPattern>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<InferredSchema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_evolution: Option<SchemaEvolution>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityFingerprint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<ToolAssessment>,

    /// True when probing hit its deadline before all cases ran.
    #[serde(default)]
    pub partial: bool,
}

impl ToolRecord {
    /// A record with no runtime evidence yet.
    pub fn from_descriptor(descriptor: ToolDescriptor) -> Self {
        Self {
            descriptor,
            response_fingerprint: None,
            error_patterns: Vec::new(),
            response_schema: None,
            schema_evolution: None,
            performance: None,
            security: None,
            assessment: None,
            partial: false,
        }
    }
}

/// A prompt advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDescriptor {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// A resource advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A parameterized resource template advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDescriptor {
    pub uri_template: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Identity of the observed server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    /// Capability names the server advertised during the handshake.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// How and when the baseline was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMetadata {
    /// Observation mode, e.g. `interview`.
    pub mode: String,

    pub generated_at: DateTime<Utc>,

    pub cli_version: String,

    /// Command line the target was launched with, or the remote URL.
    pub server_command: String,

    pub duration_ms: u64,

    /// Persona ids that drove the interview, in order.
    #[serde(default)]
    pub personas: Vec<String>,

    /// Model identifier when an LLM collaborator participated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// True when the interview did not complete cleanly.
    #[serde(default)]
    pub partial: bool,

    /// Non-fatal problems recorded along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The capability surface observed on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub tools: Vec<ToolRecord>,

    #[serde(default)]
    pub prompts: Vec<PromptDescriptor>,

    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,

    #[serde(default)]
    pub resource_templates: Vec<ResourceTemplateDescriptor>,
}

/// Snapshot of a server's externally observable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// On-disk format version; see [`FORMAT_VERSION`].
    pub schema_version: u64,

    pub metadata: BaselineMetadata,

    pub server: ServerInfo,

    pub capabilities: Capabilities,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflows: Option<Vec<Value>>,

    /// Deterministic 0-100 score of how well the surface is documented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_score: Option<u32>,

    /// One-line human-readable roll-up.
    pub summary: String,

    /// SHA-256 over the canonical document with this field elided.
    pub integrity_hash: String,
}

impl Baseline {
    /// Looks up a tool record by name.
    pub fn tool(&self, name: &str) -> Option<&ToolRecord> {
        self.capabilities
            .tools
            .iter()
            .find(|t| t.descriptor.name == name)
    }

    /// Names of all recorded tools, in observation order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.capabilities
            .tools
            .iter()
            .map(|t| t.descriptor.name.as_str())
            .collect()
    }

    /// Builds the one-line summary from the recorded surface.
    pub fn summarize(&self) -> String {
        format!(
            "{} v{}: {} tools, {} prompts, {} resources ({} templates){}",
            self.server.name,
            self.server.version,
            self.capabilities.tools.len(),
            self.capabilities.prompts.len(),
            self.capabilities.resources.len(),
            self.capabilities.resource_templates.len(),
            if self.metadata.partial { " [partial]" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "A test tool",
            json!({"type": "object", "properties": {"q": {"type": "string"}}}),
        )
    }

    #[test]
    fn schema_hash_is_stable_across_key_order() {
        let a = ToolDescriptor::new(
            "t",
            "",
            json!({"type": "object", "properties": {"a": {"type": "string"}}}),
        );
        let b = ToolDescriptor::new(
            "t",
            "",
            json!({"properties": {"a": {"type": "string"}}, "type": "object"}),
        );
        assert_eq!(a.schema_hash, b.schema_hash);
    }

    #[test]
    fn idempotency_defaults_to_true() {
        let mut d = descriptor("t");
        assert!(d.is_idempotent());
        d.annotations = Some(ToolAnnotations {
            idempotent_hint: Some(false),
            ..Default::default()
        });
        assert!(!d.is_idempotent());
    }

    #[test]
    fn tool_record_round_trips() {
        let record = ToolRecord::from_descriptor(descriptor("echo"));
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: ToolRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.descriptor.name, "echo");
        assert!(!decoded.partial);
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let d = descriptor("echo");
        let value = serde_json::to_value(&d).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("schemaHash").is_some());
        assert!(value.get("input_schema").is_none());
    }
}
