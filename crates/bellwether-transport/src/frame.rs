//! JSON-RPC 2.0 framing.
//!
//! Requests and responses are newline-delimited JSON objects on the stdio
//! transport and plain bodies on HTTP. Only the client role is implemented:
//! this crate sends requests and notifications and routes responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request or notification (no `id`).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn call(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Encodes the request as one newline-terminated frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// A JSON-RPC response frame.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,

    pub id: Option<Value>,

    pub result: Option<Value>,

    pub error: Option<JsonRpcErrorBody>,
}

/// The `error` member of a response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,

    #[allow(dead_code)]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Numeric id of the response, when present and numeric.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_frame_shape() {
        let frame = JsonRpcRequest::call(7, "tools/list", None).to_frame().unwrap();
        assert!(frame.ends_with('\n'));
        let value: Value = serde_json::from_str(frame.trim()).unwrap();
        assert_eq!(value["jsonrpc"], json!("2.0"));
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["method"], json!("tools/list"));
        assert!(value.get("params").is_none());
    }

    #[test]
    fn notification_has_no_id() {
        let frame = JsonRpcRequest::notification("notifications/initialized", None)
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(frame.trim()).unwrap();
        assert!(value.get("id").is_none());
    }

    #[test]
    fn response_parses_result_and_error() {
        let ok: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#).unwrap();
        assert_eq!(ok.numeric_id(), Some(3));
        assert!(ok.result.is_some());
        assert!(ok.error.is_none());

        let err: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32602,"message":"Invalid params"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.as_ref().unwrap().code, -32602);
    }
}
