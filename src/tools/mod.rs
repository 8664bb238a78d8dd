/// Tool execution capability consumed by the protocol engine
///
/// The engine never implements tools itself. It talks to a `ToolExecutor`
/// that lists the tool catalog and runs a named tool, failing with one of a
/// bounded set of `ToolError` kinds.

pub mod backend;
pub mod catalog;
pub mod result;

pub use backend::BackendToolExecutor;
pub use catalog::{ApiRoute, CatalogEntry, CatalogError, HttpMethod, ToolCatalog};
pub use result::{shape_tool_outcome, CallToolResult, ToolContent};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Description of a single tool as advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments, always a JSON object
    pub input_schema: Value,
}

/// Structured failure details reported by the backend
///
/// Mirrors the RFC 7807 problem shape the backend API returns, plus the
/// field-level validation errors map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ProblemDetails {
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code: Some(status_code),
            ..Self::default()
        }
    }

    /// Add a validation message for one field
    pub fn field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status_code.is_none()
            && self.title.is_none()
            && self.detail.is_none()
            && self.errors.is_empty()
    }
}

/// Failures a tool execution can report
///
/// The first four kinds are expected failures: they are shaped into an
/// `isError: true` tool result. `Unknown` is never caught by result shaping
/// and surfaces as a protocol-level error instead.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{message}")]
    Validation {
        message: String,
        details: ProblemDetails,
    },

    #[error("{message}")]
    Timeout { message: String },

    #[error("{message}")]
    Transport {
        message: String,
        details: ProblemDetails,
    },

    #[error("{message}")]
    InvalidOperation { message: String },

    #[error("Unexpected tool failure: {0}")]
    Unknown(String),
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation {
            message: message.into(),
            details: ProblemDetails::default(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        ToolError::InvalidOperation {
            message: message.into(),
        }
    }

    /// Rich error details, if this kind carries any
    pub fn details(&self) -> Option<&ProblemDetails> {
        match self {
            ToolError::Validation { details, .. } | ToolError::Transport { details, .. } => {
                Some(details)
            }
            _ => None,
        }
    }

    /// Whether result shaping turns this failure into an `isError` result
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ToolError::Unknown(_))
    }
}

/// Capability that lists and runs tools on behalf of one caller
///
/// The HTTP transport holds one executor per session, the stdio transport
/// one per connection.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool definitions available to this caller, in catalog order
    fn list_tools(&self) -> &[ToolDefinition];

    /// Run the named tool with the given JSON arguments
    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError>;
}

/// Creates a fresh executor for each new HTTP session
pub trait ToolExecutorFactory: Send + Sync {
    fn create(&self) -> Arc<dyn ToolExecutor>;
}

impl<F> ToolExecutorFactory for F
where
    F: Fn() -> Arc<dyn ToolExecutor> + Send + Sync,
{
    fn create(&self) -> Arc<dyn ToolExecutor> {
        self()
    }
}
