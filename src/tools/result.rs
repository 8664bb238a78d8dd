/// Shaping of tool executions into MCP `CallToolResult` payloads
///
/// Both successful and failed executions come out as a `CallToolResult`, so
/// the JSON-RPC layer always reports the call itself as a success.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::tools::ToolError;

/// Result payload of a `tools/call` request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

/// One content block of a tool result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl CallToolResult {
    /// Wrap a successful execution payload as text content
    pub fn success(payload: &Value) -> Self {
        Self::text(payload, false)
    }

    /// Build an `isError` result describing a recoverable tool failure
    pub fn failure(tool: &str, error: &ToolError) -> Self {
        let mut payload = Map::new();
        payload.insert("message".to_string(), json!(error.to_string()));
        payload.insert("tool".to_string(), json!(tool));

        if let Some(details) = error.details() {
            if let Some(status_code) = details.status_code {
                payload.insert("statusCode".to_string(), json!(status_code));
            }
            if let Some(title) = &details.title {
                payload.insert("title".to_string(), json!(title));
            }
            if let Some(detail) = &details.detail {
                payload.insert("detail".to_string(), json!(detail));
            }
            if !details.errors.is_empty() {
                payload.insert("errors".to_string(), json!(details.errors));
            }
        }

        Self::text(&Value::Object(payload), true)
    }

    fn text(payload: &Value, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: payload.to_string(),
            }],
            is_error,
        }
    }
}

/// Normalize a tool outcome into a `CallToolResult`
///
/// `ToolError::Unknown` is handed back unchanged so the caller reports it as
/// an unexpected failure.
pub fn shape_tool_outcome(
    tool: &str,
    outcome: Result<Value, ToolError>,
) -> Result<CallToolResult, ToolError> {
    match outcome {
        Ok(payload) => Ok(CallToolResult::success(&payload)),
        Err(error) if error.is_recoverable() => {
            tracing::warn!("Tool '{}' failed: {}", tool, error);
            Ok(CallToolResult::failure(tool, &error))
        }
        Err(error) => Err(error),
    }
}
