/// MCP (Model Context Protocol) message structures and JSON-RPC handling
///
/// This module defines the JSON-RPC envelopes shared by both transports,
/// parses incoming requests and builds success and error responses.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// MCP protocol version we support
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

// JSON-RPC error codes
pub mod error_codes {
    /// Generic application error, used for protocol-level failures
    pub const SERVER_ERROR: i32 = -32000;
    /// Internal error, used by the stdio transport for failed dispatches
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// A parsed JSON-RPC 2.0 request or notification
///
/// `id` keeps the difference between an absent id (a notification) and an
/// explicit `"id": null`, which is a request expecting a response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub method: String,
    pub id: Option<Value>,
    /// Request parameters, `Value::Null` when absent
    pub params: Value,
}

impl JsonRpcRequest {
    /// Whether the peer expects a response to this message
    pub fn expects_response(&self) -> bool {
        self.id.is_some()
    }
}

/// Errors from turning raw bytes into a `JsonRpcRequest`
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload is JSON but has no string `method`; carries the id if any
    #[error("Invalid request: 'method' must be a string")]
    MissingMethod { id: Option<Value> },
}

/// Parse raw bytes as one JSON-RPC request
pub fn parse_request(raw: &[u8]) -> Result<JsonRpcRequest, ParseError> {
    let value: Value = serde_json::from_slice(raw)?;
    parse_request_value(value)
}

/// Interpret an already-parsed JSON document as one JSON-RPC request
pub fn parse_request_value(value: Value) -> Result<JsonRpcRequest, ParseError> {
    let Value::Object(mut object) = value else {
        return Err(ParseError::MissingMethod { id: None });
    };

    let id = object.remove("id");
    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(ParseError::MissingMethod { id }),
    };
    let params = object.remove("params").unwrap_or(Value::Null);

    Ok(JsonRpcRequest { method, id, params })
}

/// JSON-RPC 2.0 response message
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that we're responding to
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: &Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.clone(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response with the generic application error code
    pub fn error(id: &Value, message: impl Into<String>) -> Self {
        Self::error_with_code(id, message, error_codes::SERVER_ERROR)
    }

    /// Create an error response with an explicit code
    pub fn error_with_code(id: &Value, message: impl Into<String>, code: i32) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.clone(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Capabilities advertised in the `initialize` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    pub tools: ListCapability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListCapability>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCapability {
    pub list_changed: bool,
}

/// MCP initialization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

/// Name and version reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
