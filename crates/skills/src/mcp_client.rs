//! MCP client over streamable HTTP.
//!
//! Each session performs the `initialize` handshake, carries the server's
//! `Mcp-Session-Id` on every later request and accepts both plain JSON and
//! SSE-framed responses.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{json, Map, Value};

use agent_mesh_core::{
    config::McpConfig,
    traits::{ToolConnector, ToolSession},
    types::{CallToolResult, JsonRpcRequest, JsonRpcResponse, ResourceDescriptor, ToolDescriptor},
    Error, Result,
};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Upper bound on `tools/list` pages followed through `nextCursor`.
const MAX_PAGES: usize = 32;

/// Opens [`McpSession`]s with a shared HTTP client.
#[derive(Clone)]
pub struct McpHttpConnector {
    http: reqwest::Client,
}

impl McpHttpConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    pub fn from_config(config: &McpConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }
}

#[async_trait]
impl ToolConnector for McpHttpConnector {
    async fn connect(&self, server_url: &str) -> Result<Arc<dyn ToolSession>> {
        let session = McpSession::open(self.http.clone(), server_url).await?;
        Ok(Arc::new(session))
    }
}

/// One initialized MCP session.
pub struct McpSession {
    http: reqwest::Client,
    url: String,
    session_id: Option<String>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl McpSession {
    /// Connect and complete the `initialize` handshake.
    pub async fn open(http: reqwest::Client, url: &str) -> Result<Self> {
        let mut session = Self {
            http,
            url: url.to_string(),
            session_id: None,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        };

        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });
        let request = JsonRpcRequest::new(session.next_id(), "initialize", params);
        let response = session.post(&request).await?;
        session.session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let result = decode_response(response).await?;

        tracing::debug!(
            url = %session.url,
            session_id = ?session.session_id,
            server = %result.pointer("/serverInfo/name").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            "MCP session initialized"
        );

        let initialized = JsonRpcRequest::notification("notifications/initialized");
        if let Err(e) = session.post(&initialized).await {
            tracing::debug!(error = %e, "initialized notification not accepted");
        }
        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .json(request);
        if let Some(id) = &self.session_id {
            builder = builder.header(SESSION_HEADER, id);
        }
        let response = builder.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "MCP server returned {}: {}",
                status,
                truncate(&body, 200)
            )));
        }
        Ok(response)
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::mcp("session is closed"));
        }
        let request = JsonRpcRequest::new(self.next_id(), method, params);
        let response = self.post(&request).await?;
        decode_response(response).await
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("MCP request timed out: {}", e))
    } else {
        Error::transport(format!("MCP request failed: {}", e))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Payload of the last SSE `data:` event that looks like JSON.
pub fn extract_sse_data(body: &str) -> Option<String> {
    let mut events = Vec::new();
    let mut current: Option<String> = None;

    for line in body.lines() {
        let line = line.trim_start();
        if let Some(rest) = line.strip_prefix("data:") {
            let data = current.get_or_insert_with(String::new);
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.trim_start());
        } else if line.is_empty() || line.starts_with("event:") {
            events.extend(current.take().filter(|d| !d.is_empty()));
        }
    }
    events.extend(current.filter(|d| !d.is_empty()));

    events.into_iter().rev().find(|data| {
        let data = data.trim_start();
        (data.starts_with('{') || data.starts_with('[')) && serde_json::from_str::<Value>(data).is_ok()
    })
}

async fn decode_response(response: reqwest::Response) -> Result<Value> {
    let is_sse = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"));
    let body = response.text().await.map_err(transport_error)?;
    parse_rpc_body(&body, is_sse)
}

/// Unwrap a JSON-RPC response body into its `result`.
pub fn parse_rpc_body(body: &str, is_sse: bool) -> Result<Value> {
    let payload = if is_sse {
        extract_sse_data(body).unwrap_or_else(|| body.to_string())
    } else {
        body.to_string()
    };

    let response: JsonRpcResponse = serde_json::from_str(&payload)
        .map_err(|e| Error::transport(format!("Malformed MCP response: {} (body: {})", e, truncate(&payload, 200))))?;

    if let Some(error) = response.error {
        return Err(Error::mcp(format!("{} (code {})", error.message, error.code)));
    }
    response
        .result
        .ok_or_else(|| Error::transport("MCP response has neither result nor error"))
}

#[async_trait]
impl ToolSession for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let result = self.rpc("tools/list", params).await?;
            let page = result.get("tools").and_then(Value::as_array).cloned().unwrap_or_default();
            for raw in page {
                match serde_json::from_value::<ToolDescriptor>(raw) {
                    Ok(tool) if !tool.name.is_empty() => tools.push(tool),
                    Ok(_) => tracing::debug!("Skipping unnamed MCP tool"),
                    Err(e) => tracing::debug!(error = %e, "Skipping malformed MCP tool entry"),
                }
            }
            cursor = result.get("nextCursor").and_then(Value::as_str).map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        let result = self
            .rpc("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        let result = self.rpc("resources/list", json!({})).await?;
        let resources = result.get("resources").cloned().unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(resources)?)
    }

    async fn read_resource(&self, uri: &str) -> Result<Value> {
        self.rpc("resources/read", json!({ "uri": uri })).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let Some(id) = &self.session_id else {
            return Ok(());
        };
        // Servers may not support explicit termination.
        if let Err(e) = self.http.delete(&self.url).header(SESSION_HEADER, id).send().await {
            tracing::debug!(error = %e, "MCP session termination failed");
        }
        Ok(())
    }
}

/// Run `f` against a fresh session and close it afterwards, whatever `f` returned.
pub async fn with_session<T, F, Fut>(connector: &dyn ToolConnector, server_url: &str, f: F) -> Result<T>
where
    F: FnOnce(Arc<dyn ToolSession>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = connector.connect(server_url).await?;
    let result = f(session.clone()).await;
    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "Closing MCP session failed");
    }
    result
}
