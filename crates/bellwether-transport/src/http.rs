//! # Streaming HTTP Transport
//!
//! JSON-RPC over HTTP POST. Each call posts one request body and accepts
//! either a plain JSON response or a `text/event-stream` body whose first
//! matching `data:` event carries the response. A server-assigned session
//! id, when offered on the initialize response, is echoed on every later
//! call.

use crate::error::{Result, TransportError};
use crate::frame::{JsonRpcRequest, JsonRpcResponse};
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const SESSION_HEADER: &str = "Mcp-Session-Id";

/// How to reach the remote server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub url: String,

    /// Extra headers sent on every request, e.g. authorization.
    pub headers: Vec<(String, String)>,
}

impl HttpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }
}

/// A JSON-RPC session over streaming HTTP.
pub struct HttpSession {
    client: reqwest::Client,
    config: HttpConfig,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl HttpSession {
    /// Builds the session. No request is made until the first call.
    pub fn connect(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            client,
            config,
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    async fn post(
        &self,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> Result<Option<JsonRpcResponse>> {
        let mut builder = self
            .client
            .post(&self.config.url)
            .timeout(timeout)
            .header("Accept", "application/json, text/event-stream")
            .json(request);

        for (key, value) in &self.config.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(id) = self.session_id.lock().expect("session id poisoned").clone() {
            builder = builder.header(SESSION_HEADER, id);
        }

        let method = request.method.clone();
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    method: method.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else if e.is_connect() {
                TransportError::Startup(e.to_string())
            } else {
                TransportError::Http(e.to_string())
            }
        })?;

        // Adopt a server-assigned session id as soon as one appears.
        if let Some(assigned) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut slot = self.session_id.lock().expect("session id poisoned");
            if slot.as_deref() != Some(assigned) {
                debug!(session_id = assigned, "adopted server session id");
                *slot = Some(assigned.to_string());
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http(format!("server answered {status}")));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if request.id.is_none() {
            // Notification: the body, if any, is not for us.
            return Ok(None);
        }

        if content_type.starts_with("text/event-stream") {
            parse_event_stream(&body, request.id).map(Some)
        } else {
            serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| TransportError::Protocol(format!("malformed response body: {e}")))
        }
    }
}

/// Extracts the response frame for `id` from an SSE body.
fn parse_event_stream(body: &str, id: Option<u64>) -> Result<JsonRpcResponse> {
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }
        if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(data) {
            if response.numeric_id() == id || id.is_none() {
                return Ok(response);
            }
        }
    }
    Err(TransportError::Protocol(
        "event stream carried no matching response".into(),
    ))
}

#[async_trait]
impl Session for HttpSession {
    async fn call(&self, method: &str, params: Option<Value>, timeout: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::call(id, method, params);
        let response = self
            .post(&request, timeout)
            .await?
            .ok_or_else(|| TransportError::Protocol("empty response".into()))?;

        match (response.result, response.error) {
            (_, Some(err)) => Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(TransportError::Protocol(
                "response carries neither result nor error".into(),
            )),
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let request = JsonRpcRequest::notification(method, params);
        self.post(&request, Duration::from_secs(10)).await.map(|_| ())
    }

    async fn disconnect(&self) {
        // Best effort: tell the server the session is over.
        let session_id = self.session_id.lock().expect("session id poisoned").clone();
        if let Some(id) = session_id {
            let _ = self
                .client
                .delete(&self.config.url)
                .header(SESSION_HEADER, id)
                .timeout(Duration::from_secs(2))
                .send()
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_stream_parsing_picks_matching_id() {
        let body = concat!(
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":9,\"result\":{\"other\":true}}\n",
            "\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"mine\":true}}\n",
        );
        let response = parse_event_stream(body, Some(3)).unwrap();
        assert_eq!(response.result.unwrap()["mine"], serde_json::json!(true));
    }

    #[test]
    fn event_stream_without_match_is_protocol_error() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"id\":9,\"result\":{}}\n";
        match parse_event_stream(body, Some(1)) {
            Err(TransportError::Protocol(_)) => {}
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_against_local_http_server() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            let body = r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
            let reply = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\nMcp-Session-Id: abc-123\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
        });

        let session = HttpSession::connect(HttpConfig::new(format!("http://{addr}/rpc"))).unwrap();
        let result = session
            .call("initialize", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result["ok"], serde_json::json!(true));
        assert_eq!(
            session.session_id.lock().unwrap().as_deref(),
            Some("abc-123")
        );
    }
}
