//! JSON-RPC (`tools/call`) HTTP client for a product-data service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Map, Value};

use super::{ProductDataService, RemoteError, RemoteResult, RemoteTools};
use crate::error::{BomError, RemoteErrorKind, Result};

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i64 = -32601;

/// Upper bound on the wait between retries.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Service base URL; calls are POSTed to `{base_url}/message`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retries for failed requests
    pub max_retries: u8,
    /// Tool names with fallbacks
    pub tools: RemoteTools,
    /// BOM view passed to structure calls
    pub view: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            tools: RemoteTools::default(),
            view: Some("Design".to_string()),
        }
    }
}

/// Why a single tool call produced nothing.
#[derive(Debug)]
enum CallError {
    /// The server does not know the tool; try the next name
    ToolMissing,
    NotFound,
    Unavailable(String),
}

/// Blocking HTTP client speaking JSON-RPC `tools/call`.
pub struct HttpProductClient {
    client: Client,
    config: HttpClientConfig,
}

/// Helper to convert reqwest errors to remote errors
fn network_error(msg: &str, err: &reqwest::Error) -> CallError {
    CallError::Unavailable(format!("{msg}: {err}"))
}

impl HttpProductClient {
    /// Create a new client.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| {
                BomError::remote(
                    "Failed to create HTTP client",
                    RemoteErrorKind::NetworkError(e.to_string()),
                )
            })?;

        Ok(Self { client, config })
    }

    /// Check whether the service answers at all.
    pub fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.config.base_url.trim_end_matches('/'))
            .send()
            .map_err(|e| {
                BomError::remote(
                    "Health check request failed",
                    RemoteErrorKind::NetworkError(e.to_string()),
                )
            })?;
        Ok(response.status().is_success())
    }

    fn endpoint(&self) -> String {
        format!("{}/message", self.config.base_url.trim_end_matches('/'))
    }

    /// Call the first tool name the server knows.
    fn call_tool(&self, names: &[String], arguments: &Value) -> RemoteResult {
        for name in names {
            match self.call_with_retry(name, arguments) {
                Ok(value) => return Ok(value),
                Err(CallError::ToolMissing) => {
                    tracing::debug!(tool = %name, "Tool not available; trying next name");
                }
                Err(CallError::NotFound) => return Err(RemoteError::NotFound),
                Err(CallError::Unavailable(msg)) => return Err(RemoteError::Unavailable(msg)),
            }
        }
        Err(RemoteError::Unavailable(format!(
            "none of the tools {names:?} is available"
        )))
    }

    fn call_with_retry(&self, tool: &str, arguments: &Value) -> std::result::Result<Value, CallError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {"name": tool, "arguments": arguments},
            "id": 1
        });

        let mut last_error = CallError::Unavailable("no attempt made".into());
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                std::thread::sleep(delay);
                tracing::debug!("Retry attempt {} after {:?}", attempt, delay);
            }

            match self.send(&payload) {
                Err(CallError::Unavailable(msg)) => {
                    tracing::debug!(tool, "Request attempt {} failed: {}", attempt + 1, msg);
                    last_error = CallError::Unavailable(msg);
                }
                other => return other,
            }
        }
        Err(last_error)
    }

    fn send(&self, payload: &Value) -> std::result::Result<Value, CallError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(payload)
            .send()
            .map_err(|e| network_error("Failed to send request", &e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(CallError::Unavailable(format!(
                "service returned error status {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Tool call rejected");
            return Err(CallError::NotFound);
        }

        let body: Value = response
            .json()
            .map_err(|e| CallError::Unavailable(format!("invalid response: {e}")))?;
        interpret_reply(body)
    }
}

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, ...
/// capped at [`MAX_BACKOFF`].
fn backoff_delay(attempt: u8) -> Duration {
    let exponent = u32::from(attempt.saturating_sub(1));
    let secs = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Map a JSON-RPC reply to a value or a call error.
fn interpret_reply(body: Value) -> std::result::Result<Value, CallError> {
    if let Some(error) = body.get("error") {
        if error.get("code").and_then(Value::as_i64) == Some(METHOD_NOT_FOUND) {
            return Err(CallError::ToolMissing);
        }
        tracing::debug!(error = %error, "Tool returned an error");
        return Err(CallError::NotFound);
    }
    let result = match body {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    };
    let result = unwrap_content(result);
    if crate::cache::is_empty_response(&result) {
        return Err(CallError::NotFound);
    }
    Ok(result)
}

/// Unwrap MCP-style `{"content": [{"type": "text", "text": "<json>"}]}`.
fn unwrap_content(result: Value) -> Value {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().find_map(|item| item.get("text")?.as_str()));
    match text.map(serde_json::from_str::<Value>) {
        Some(Ok(parsed)) => parsed,
        _ => result,
    }
}

/// Candidate list out of a search reply.
fn search_results(result: Value) -> Value {
    match result {
        Value::Object(mut map) => ["results", "value", "items"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(list @ Value::Array(_)) => Some(list),
                _ => None,
            })
            .unwrap_or_else(|| Value::Array(vec![Value::Object(map)])),
        other => other,
    }
}

fn first_identifier(results: &Value) -> Option<String> {
    let first: &Map<String, Value> = results.as_array()?.first()?.as_object()?;
    ["oid", "ID", "id", "PartId"]
        .iter()
        .find_map(|key| first.get(*key)?.as_str().map(str::to_string))
}

impl ProductDataService for HttpProductClient {
    fn search(&self, number: &str, limit: usize) -> RemoteResult {
        let result = self.call_tool(
            &self.config.tools.search,
            &json!({"query": number, "limit": limit}),
        )?;
        let results = search_results(result);
        if crate::cache::is_empty_response(&results) {
            return Err(RemoteError::NotFound);
        }
        Ok(results)
    }

    fn get_details(&self, id: &str) -> RemoteResult {
        self.call_tool(&self.config.tools.details, &json!({"partId": id}))
    }

    fn get_details_by_number(&self, number: &str) -> RemoteResult {
        let results = self.search(number, 1)?;
        let id = first_identifier(&results).ok_or(RemoteError::NotFound)?;
        self.get_details(&id)
    }

    fn get_substructure(&self, id: &str, depth: usize) -> RemoteResult {
        let mut arguments = json!({"partId": id, "depth": depth});
        if let (Some(view), Some(args)) = (&self.config.view, arguments.as_object_mut()) {
            args.insert("viewName".into(), Value::String(view.clone()));
        }
        self.call_tool(&self.config.tools.structure, &arguments)
    }

    fn get_substructure_by_number(&self, number: &str, depth: usize) -> RemoteResult {
        let results = self.search(number, 1)?;
        let id = first_identifier(&results).ok_or(RemoteError::NotFound)?;
        self.get_substructure(&id, depth)
    }

    fn name(&self) -> &'static str {
        "json-rpc"
    }
}
