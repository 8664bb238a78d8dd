/// Dispatcher behaviour seen through the public API
use mission_mcp::mcp::protocol::parse_request;
use mission_mcp::{DispatchError, Dispatcher, ToolExecutor, MCP_VERSION};
use serde_json::{json, Value};

use super::support::FakeExecutor;

async fn dispatch(raw: &str) -> Result<Option<Value>, DispatchError> {
    let request = parse_request(raw.as_bytes()).expect("test request should parse");
    Dispatcher::default()
        .dispatch(&request, &FakeExecutor::new())
        .await
}

#[tokio::test]
async fn test_initialize_reports_protocol_version() {
    let result = dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result["protocolVersion"], json!(MCP_VERSION));
    assert_eq!(result["serverInfo"]["name"], json!("mission-mcp"));
}

#[tokio::test]
async fn test_tools_list_matches_catalog() {
    let executor = FakeExecutor::new();
    let result = dispatch(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .unwrap()
        .unwrap();

    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), executor.list_tools().len());
    for (listed, defined) in tools.iter().zip(executor.list_tools()) {
        assert_eq!(listed["name"], json!(defined.name));
        assert_eq!(listed["description"], json!(defined.description));
        assert_eq!(listed["inputSchema"], defined.input_schema);
    }
}

#[tokio::test]
async fn test_tools_list_output_is_a_copy() {
    let executor = FakeExecutor::new();
    let dispatcher = Dispatcher::default();
    let request =
        parse_request(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();

    let mut first = dispatcher.dispatch(&request, &executor).await.unwrap().unwrap();
    first["tools"][0]["inputSchema"]["properties"] = json!({"injected": true});

    let second = dispatcher.dispatch(&request, &executor).await.unwrap().unwrap();
    assert_eq!(second["tools"][0]["inputSchema"], executor.list_tools()[0].input_schema);
}

#[tokio::test]
async fn test_tools_call_success_payload() {
    let result = dispatch(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"create_mission","arguments":{"name":"Artemis"}}}"#,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(result["isError"], json!(false));
    let payload: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload, json!({"id": 2, "name": "Artemis"}));
}

#[tokio::test]
async fn test_unknown_tool_is_a_tool_error_not_a_protocol_error() {
    let result = dispatch(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"launch_rocket"}}"#,
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(result["isError"], json!(true));
    let payload: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload["message"], json!("Unknown tool: launch_rocket"));
    assert_eq!(payload["tool"], json!("launch_rocket"));
}

#[tokio::test]
async fn test_unsupported_methods() {
    for method in ["resources/list", "tools/delete", "INITIALIZE", ""] {
        let raw = json!({"jsonrpc": "2.0", "id": 1, "method": method}).to_string();
        let error = dispatch(&raw).await.unwrap_err();
        assert!(matches!(error, DispatchError::UnsupportedMethod(ref m) if m == method));
    }
}
