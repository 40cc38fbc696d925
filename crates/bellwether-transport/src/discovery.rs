//! # Capability Discovery
//!
//! Performs the protocol handshake against a live session and normalizes
//! what the server advertises: `initialize` (recording the negotiated
//! protocol version and capability set), then the list calls for tools,
//! prompts, resources, and resource templates, each gated on the advertised
//! capability and paginated by cursor.
//!
//! Failure policy: `initialize` and `tools/list` are load-bearing and their
//! failure is fatal. The optional surfaces degrade to empty lists with a
//! recorded warning instead.

use crate::error::{Result, TransportError};
use crate::session::Session;
use bellwether_baseline::{
    PromptDescriptor, ResourceDescriptor, ResourceTemplateDescriptor, ServerInfo, ToolAnnotations,
    ToolDescriptor,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Protocol revision this client speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Everything the handshake learned about the server.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub server: ServerInfo,
    pub tools: Vec<ToolDescriptor>,
    pub prompts: Vec<PromptDescriptor>,
    pub resources: Vec<ResourceDescriptor>,
    pub resource_templates: Vec<ResourceTemplateDescriptor>,

    /// Non-fatal problems hit along the way; these flow into baseline
    /// metadata.
    pub warnings: Vec<String>,
}

/// Runs the full discovery handshake.
pub async fn discover(session: &dyn Session, timeout: Duration) -> Result<DiscoveryResult> {
    let init = session
        .call(
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "bellwether",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
            timeout,
        )
        .await?;

    let protocol_version = init
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION)
        .to_string();
    let server_info = init.get("serverInfo").cloned().unwrap_or(Value::Null);
    let mut capabilities: Vec<String> = init
        .get("capabilities")
        .and_then(Value::as_object)
        .map(|caps| caps.keys().cloned().collect())
        .unwrap_or_default();
    capabilities.sort();

    let server = ServerInfo {
        name: server_info
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        version: server_info
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        protocol_version,
        capabilities: capabilities.clone(),
    };
    debug!(server = %server.name, protocol = %server.protocol_version, "initialized");

    // The server may not process requests until it hears this.
    if let Err(err) = session.notify("notifications/initialized", None).await {
        warn!(%err, "failed to send initialized notification");
    }

    let mut warnings = Vec::new();

    // tools/list is load-bearing: a server that cannot enumerate its tools
    // cannot be baselined.
    let tools = list_paginated(session, "tools/list", "tools", timeout).await?;
    let tools: Vec<ToolDescriptor> = tools
        .into_iter()
        .filter_map(|raw| match parse_tool(&raw) {
            Some(tool) => Some(tool),
            None => {
                warnings.push(format!("skipping malformed tool entry: {raw}"));
                None
            }
        })
        .collect();

    let prompts = if capabilities.iter().any(|c| c == "prompts") {
        match list_paginated(session, "prompts/list", "prompts", timeout).await {
            Ok(raw) => raw.iter().filter_map(parse_prompt).collect(),
            Err(err) => {
                warnings.push(format!("prompts/list failed: {err}"));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let (resources, resource_templates) = if capabilities.iter().any(|c| c == "resources") {
        let resources = match list_paginated(session, "resources/list", "resources", timeout).await
        {
            Ok(raw) => raw.iter().filter_map(parse_resource).collect(),
            Err(err) => {
                warnings.push(format!("resources/list failed: {err}"));
                Vec::new()
            }
        };
        let templates = match list_paginated(
            session,
            "resources/templates/list",
            "resourceTemplates",
            timeout,
        )
        .await
        {
            Ok(raw) => raw.iter().filter_map(parse_resource_template).collect(),
            Err(err) => {
                warnings.push(format!("resources/templates/list failed: {err}"));
                Vec::new()
            }
        };
        (resources, templates)
    } else {
        (Vec::new(), Vec::new())
    };

    Ok(DiscoveryResult {
        server,
        tools,
        prompts,
        resources,
        resource_templates,
        warnings,
    })
}

/// Drains a cursor-paginated list endpoint.
async fn list_paginated(
    session: &dyn Session,
    method: &str,
    key: &str,
    timeout: Duration,
) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
        let result = session.call(method, params, timeout).await?;

        if let Some(items) = result.get(key).and_then(Value::as_array) {
            out.extend(items.iter().cloned());
        }

        cursor = result
            .get("nextCursor")
            .and_then(Value::as_str)
            .map(String::from);
        if cursor.is_none() {
            return Ok(out);
        }
        // A server that keeps handing out cursors forever is misbehaving.
        if out.len() > 10_000 {
            return Err(TransportError::Protocol(format!(
                "{method} pagination did not terminate"
            )));
        }
    }
}

fn parse_tool(raw: &Value) -> Option<ToolDescriptor> {
    let name = raw.get("name").and_then(Value::as_str)?;
    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let input_schema = raw
        .get("inputSchema")
        .cloned()
        .unwrap_or_else(|| json!({"type": "object"}));

    let mut tool = ToolDescriptor::new(name, description, input_schema);
    tool.title = raw.get("title").and_then(Value::as_str).map(String::from);
    tool.output_schema = raw.get("outputSchema").cloned();
    tool.execution = raw.get("execution").cloned();
    tool.annotations = raw.get("annotations").and_then(parse_annotations);
    Some(tool)
}

fn parse_annotations(raw: &Value) -> Option<ToolAnnotations> {
    let obj = raw.as_object()?;
    Some(ToolAnnotations {
        destructive_hint: obj.get("destructiveHint").and_then(Value::as_bool),
        read_only_hint: obj.get("readOnlyHint").and_then(Value::as_bool),
        idempotent_hint: obj.get("idempotentHint").and_then(Value::as_bool),
        open_world_hint: obj.get("openWorldHint").and_then(Value::as_bool),
    })
}

fn parse_prompt(raw: &Value) -> Option<PromptDescriptor> {
    Some(PromptDescriptor {
        name: raw.get("name").and_then(Value::as_str)?.to_string(),
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        arguments: raw.get("arguments").cloned(),
    })
}

fn parse_resource(raw: &Value) -> Option<ResourceDescriptor> {
    Some(ResourceDescriptor {
        uri: raw.get("uri").and_then(Value::as_str)?.to_string(),
        name: raw.get("name").and_then(Value::as_str).map(String::from),
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        mime_type: raw.get("mimeType").and_then(Value::as_str).map(String::from),
    })
}

fn parse_resource_template(raw: &Value) -> Option<ResourceTemplateDescriptor> {
    Some(ResourceTemplateDescriptor {
        uri_template: raw.get("uriTemplate").and_then(Value::as_str)?.to_string(),
        name: raw.get("name").and_then(Value::as_str).map(String::from),
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        mime_type: raw.get("mimeType").and_then(Value::as_str).map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted session: maps method names to canned outcomes.
    struct Scripted {
        responses: HashMap<String, Result<Value>>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(entries: Vec<(&str, Result<Value>)>) -> Self {
            Self {
                responses: entries
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Session for Scripted {
        async fn call(
            &self,
            method: &str,
            _params: Option<Value>,
            _timeout: Duration,
        ) -> Result<Value> {
            self.calls.lock().unwrap().push(method.to_string());
            match self.responses.get(method) {
                Some(Ok(v)) => Ok(v.clone()),
                Some(Err(_)) => Err(TransportError::Rpc {
                    code: -32000,
                    message: "scripted failure".into(),
                }),
                None => Err(TransportError::Rpc {
                    code: -32601,
                    message: format!("method not found: {method}"),
                }),
            }
        }

        async fn notify(&self, _method: &str, _params: Option<Value>) -> Result<()> {
            Ok(())
        }

        async fn disconnect(&self) {}
    }

    fn init_response(caps: Value) -> Value {
        json!({
            "protocolVersion": "2025-03-26",
            "capabilities": caps,
            "serverInfo": {"name": "scripted", "version": "2.1.0"}
        })
    }

    #[tokio::test]
    async fn full_surface_discovery() {
        let session = Scripted::new(vec![
            (
                "initialize",
                Ok(init_response(json!({"tools": {}, "prompts": {}, "resources": {}}))),
            ),
            (
                "tools/list",
                Ok(json!({"tools": [{
                    "name": "get_weather",
                    "description": "Weather by city",
                    "inputSchema": {"type": "object", "properties": {"city": {"type": "string"}}},
                    "annotations": {"readOnlyHint": true, "idempotentHint": true}
                }]})),
            ),
            (
                "prompts/list",
                Ok(json!({"prompts": [{"name": "summarize", "description": "Summarize text"}]})),
            ),
            (
                "resources/list",
                Ok(json!({"resources": [{"uri": "file:///data.txt", "mimeType": "text/plain"}]})),
            ),
            (
                "resources/templates/list",
                Ok(json!({"resourceTemplates": [{"uriTemplate": "file:///logs/{date}.log"}]})),
            ),
        ]);

        let result = discover(&session, Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.server.name, "scripted");
        assert_eq!(result.server.protocol_version, "2025-03-26");
        assert_eq!(result.server.capabilities, vec!["prompts", "resources", "tools"]);
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "get_weather");
        assert!(!result.tools[0].schema_hash.is_empty());
        assert_eq!(
            result.tools[0].annotations.as_ref().unwrap().read_only_hint,
            Some(true)
        );
        assert_eq!(result.prompts.len(), 1);
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.resource_templates.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn optional_surface_failures_degrade() {
        let session = Scripted::new(vec![
            (
                "initialize",
                Ok(init_response(json!({"tools": {}, "prompts": {}}))),
            ),
            ("tools/list", Ok(json!({"tools": []}))),
            (
                "prompts/list",
                Err(TransportError::Rpc {
                    code: -32000,
                    message: "scripted failure".into(),
                }),
            ),
        ]);

        let result = discover(&session, Duration::from_secs(1)).await.unwrap();
        assert!(result.prompts.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("prompts/list"));
    }

    #[tokio::test]
    async fn tools_list_failure_is_fatal() {
        let session = Scripted::new(vec![(
            "initialize",
            Ok(init_response(json!({"tools": {}}))),
        )]);
        assert!(discover(&session, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn unadvertised_surfaces_are_not_queried() {
        let session = Scripted::new(vec![
            ("initialize", Ok(init_response(json!({"tools": {}})))),
            ("tools/list", Ok(json!({"tools": []}))),
        ]);
        let result = discover(&session, Duration::from_secs(1)).await.unwrap();
        assert!(result.prompts.is_empty());
        let calls = session.calls.lock().unwrap().clone();
        assert!(!calls.contains(&"prompts/list".to_string()));
        assert!(!calls.contains(&"resources/list".to_string()));
    }

    #[tokio::test]
    async fn malformed_tool_entries_become_warnings() {
        let session = Scripted::new(vec![
            ("initialize", Ok(init_response(json!({"tools": {}})))),
            (
                "tools/list",
                Ok(json!({"tools": [
                    {"description": "no name here"},
                    {"name": "ok_tool", "inputSchema": {"type": "object"}}
                ]})),
            ),
        ]);
        let result = discover(&session, Duration::from_secs(1)).await.unwrap();
        assert_eq!(result.tools.len(), 1);
        assert_eq!(result.tools[0].name, "ok_tool");
        assert_eq!(result.warnings.len(), 1);
    }
}
