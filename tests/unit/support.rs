/// Shared test doubles
use async_trait::async_trait;
use mission_mcp::{ProblemDetails, ToolDefinition, ToolError, ToolExecutor};
use serde_json::{json, Value};

/// In-memory executor with a fixed pair of mission tools
pub struct FakeExecutor {
    tools: Vec<ToolDefinition>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            tools: vec![
                ToolDefinition {
                    name: "list_missions".to_string(),
                    description: "List all missions".to_string(),
                    input_schema: json!({"type": "object", "properties": {}}),
                },
                ToolDefinition {
                    name: "create_mission".to_string(),
                    description: "Create a mission".to_string(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {"name": {"type": "string"}},
                        "required": ["name"]
                    }),
                },
            ],
        }
    }
}

#[async_trait]
impl ToolExecutor for FakeExecutor {
    fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        match name {
            "list_missions" => Ok(json!([{"id": 1, "name": "Apollo"}])),
            "create_mission" => match arguments.get("name").and_then(Value::as_str) {
                Some(mission) => Ok(json!({"id": 2, "name": mission})),
                None => Err(ToolError::Validation {
                    message: "Mission is invalid".to_string(),
                    details: ProblemDetails::with_status(400)
                        .field_error("Name", "The Name field is required."),
                }),
            },
            "slow" => Err(ToolError::Timeout {
                message: "Backend request timed out".to_string(),
            }),
            "explode" => Err(ToolError::Unknown("index out of range".to_string())),
            other => Err(ToolError::invalid_operation(format!("Unknown tool: {}", other))),
        }
    }
}
