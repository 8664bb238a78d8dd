/// Method router for MCP requests
///
/// Runs exactly one of the supported MCP methods against a caller's tool
/// executor. Transports decide what to do with the outcome: whether to
/// answer, and with which error code.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::mcp::protocol::{
    InitializeResult, JsonRpcRequest, ListCapability, ServerCapabilities, ServerInfo, MCP_VERSION,
};
use crate::tools::{shape_tool_outcome, ToolError, ToolExecutor};

/// Errors raised while dispatching a request
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Tool execution failed unexpectedly: {0}")]
    Tool(#[from] ToolError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The closed set of methods the engine answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Initialized,
    Ping,
    PromptsList,
    ToolsList,
    ToolsCall,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Initialize,
        Method::Initialized,
        Method::Ping,
        Method::PromptsList,
        Method::ToolsList,
        Method::ToolsCall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Initialize => "initialize",
            Method::Initialized => "notifications/initialized",
            Method::Ping => "ping",
            Method::PromptsList => "prompts/list",
            Method::ToolsList => "tools/list",
            Method::ToolsCall => "tools/call",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// `tools/call` parameters
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Routes parsed requests to their handlers
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(server_info: ServerInfo) -> Self {
        Self { server_info }
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Handle one request
    ///
    /// Returns `Ok(None)` when the method produces no output at all.
    pub async fn dispatch(
        &self,
        request: &JsonRpcRequest,
        executor: &dyn ToolExecutor,
    ) -> Result<Option<Value>, DispatchError> {
        let method = Method::from_name(&request.method)
            .ok_or_else(|| DispatchError::UnsupportedMethod(request.method.clone()))?;
        debug!("Dispatching {}", method.name());

        let result = match method {
            Method::Initialized => return Ok(None),
            Method::Initialize => self.handle_initialize()?,
            Method::Ping => json!({}),
            Method::PromptsList => json!({ "prompts": [] }),
            Method::ToolsList => handle_tools_list(executor),
            Method::ToolsCall => handle_tools_call(&request.params, executor).await?,
        };
        Ok(Some(result))
    }

    fn handle_initialize(&self) -> Result<Value, DispatchError> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListCapability { list_changed: false },
                prompts: Some(ListCapability { list_changed: false }),
            },
            server_info: self.server_info.clone(),
        };
        Ok(serde_json::to_value(result)?)
    }
}

fn handle_tools_list(executor: &dyn ToolExecutor) -> Value {
    let tools: Vec<Value> = executor
        .list_tools()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema.clone(),
            })
        })
        .collect();
    json!({ "tools": tools })
}

async fn handle_tools_call(
    params: &Value,
    executor: &dyn ToolExecutor,
) -> Result<Value, DispatchError> {
    let params = ToolCallParams::deserialize(params)
        .map_err(|e| DispatchError::InvalidParams(format!("tools/call requires params.name: {}", e)))?;
    let arguments = params.arguments.unwrap_or_else(|| json!({}));

    let outcome = executor.execute(&params.name, arguments).await;
    let result = shape_tool_outcome(&params.name, outcome)?;
    Ok(serde_json::to_value(result)?)
}
