/// Backend executor against a local stand-in for the mission API
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mission_mcp::{
    BackendToolExecutor, Dispatcher, StdioTransport, ToolCatalog, ToolError, ToolExecutor,
};
use reqwest::Url;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const CATALOG: &str = r#"[
    {
        "name": "list_missions",
        "description": "List missions, optionally filtered by status",
        "inputSchema": {"type": "object", "properties": {"status": {"type": "string"}}},
        "route": {"method": "GET", "path": "/missions"}
    },
    {
        "name": "get_mission",
        "description": "Get one mission",
        "inputSchema": {"type": "object", "properties": {"missionId": {"type": "string"}}, "required": ["missionId"]},
        "route": {"method": "GET", "path": "/missions/{missionId}"}
    },
    {
        "name": "create_mission",
        "description": "Create a mission",
        "inputSchema": {"type": "object", "properties": {"name": {"type": "string"}}},
        "route": {"method": "POST", "path": "/missions"}
    },
    {
        "name": "delete_mission",
        "description": "Delete a mission",
        "inputSchema": {"type": "object", "properties": {"missionId": {"type": "string"}}},
        "route": {"method": "DELETE", "path": "/missions/{missionId}"}
    },
    {
        "name": "slow_report",
        "description": "A report that takes too long",
        "inputSchema": {"type": "object"},
        "route": {"method": "GET", "path": "/reports/slow"}
    },
    {
        "name": "broken_report",
        "description": "A report that always fails",
        "inputSchema": {"type": "object"},
        "route": {"method": "GET", "path": "/reports/broken"}
    },
    {
        "name": "whoami",
        "description": "Echo the caller's authorization",
        "inputSchema": {"type": "object"},
        "route": {"method": "GET", "path": "/whoami"}
    },
    {
        "name": "unrouted",
        "description": "A tool with no backend route",
        "inputSchema": {"type": "object"}
    }
]"#;

async fn list_missions(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({"missions": [{"id": "1", "name": "Apollo"}], "status": params.get("status")}))
}

async fn get_mission(Path(id): Path<String>) -> Json<Value> {
    Json(json!({"id": id, "name": "Apollo"}))
}

async fn create_mission(Json(body): Json<Value>) -> Response {
    match body.get("name").and_then(Value::as_str) {
        Some(name) => (StatusCode::CREATED, Json(json!({"id": "2", "name": name}))).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "type": "https://tools.ietf.org/html/rfc9110#section-15.5.1",
                "title": "One or more validation errors occurred.",
                "status": 400,
                "errors": {"Name": ["The Name field is required."]}
            })),
        )
            .into_response(),
    }
}

async fn delete_mission(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn slow_report() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({}))
}

async fn broken_report() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable")
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization }))
}

/// Start the fake backend and return its base URL
async fn start_backend() -> Url {
    let app = Router::new()
        .route("/api/missions", get(list_missions).post(create_mission))
        .route("/api/missions/{id}", get(get_mission).delete(delete_mission))
        .route("/api/reports/slow", get(slow_report))
        .route("/api/reports/broken", get(broken_report))
        .route("/api/whoami", get(whoami));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/api/", addr)).unwrap()
}

async fn executor() -> BackendToolExecutor {
    let catalog = ToolCatalog::from_json(CATALOG).unwrap();
    BackendToolExecutor::new(catalog, start_backend().await, Duration::from_millis(300))
}

#[tokio::test]
async fn test_lists_catalog_definitions() {
    let executor = executor().await;
    let names: Vec<_> = executor.list_tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "list_missions");
}

#[tokio::test]
async fn test_get_with_query_arguments() {
    let executor = executor().await;

    let payload = executor
        .execute("list_missions", json!({"status": "active"}))
        .await
        .unwrap();

    assert_eq!(payload["status"], json!("active"));
    assert_eq!(payload["missions"][0]["name"], json!("Apollo"));
}

#[tokio::test]
async fn test_path_parameters() {
    let executor = executor().await;

    let payload = executor
        .execute("get_mission", json!({"missionId": "42"}))
        .await
        .unwrap();

    assert_eq!(payload, json!({"id": "42", "name": "Apollo"}));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let executor = executor().await;

    let payload = executor
        .execute("create_mission", json!({"name": "Artemis"}))
        .await
        .unwrap();

    assert_eq!(payload, json!({"id": "2", "name": "Artemis"}));
}

#[tokio::test]
async fn test_empty_response_is_null() {
    let executor = executor().await;

    let payload = executor
        .execute("delete_mission", json!({"missionId": "7"}))
        .await
        .unwrap();

    assert_eq!(payload, Value::Null);
}

#[tokio::test]
async fn test_validation_problem_details() {
    let executor = executor().await;

    let error = executor.execute("create_mission", json!({})).await.unwrap_err();

    match error {
        ToolError::Validation { details, .. } => {
            assert_eq!(details.status_code, Some(400));
            assert_eq!(
                details.title.as_deref(),
                Some("One or more validation errors occurred.")
            );
            assert_eq!(details.errors["Name"], vec!["The Name field is required.".to_string()]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let executor = executor().await;

    let error = executor.execute("broken_report", Value::Null).await.unwrap_err();

    match error {
        ToolError::Transport { details, .. } => {
            assert_eq!(details.status_code, Some(500));
            assert_eq!(details.detail.as_deref(), Some("database unavailable"));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout() {
    let executor = executor().await;

    let error = executor.execute("slow_report", json!({})).await.unwrap_err();

    assert!(matches!(error, ToolError::Timeout { .. }), "got {:?}", error);
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let closed: SocketAddr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let executor = BackendToolExecutor::new(
        ToolCatalog::from_json(CATALOG).unwrap(),
        Url::parse(&format!("http://{}/api/", closed)).unwrap(),
        Duration::from_secs(2),
    );

    let error = executor.execute("list_missions", json!({})).await.unwrap_err();

    assert!(matches!(error, ToolError::Transport { .. }), "got {:?}", error);
}

#[tokio::test]
async fn test_unknown_and_unrouted_tools() {
    let executor = executor().await;

    let error = executor.execute("launch", json!({})).await.unwrap_err();
    assert!(matches!(error, ToolError::InvalidOperation { .. }));

    let error = executor.execute("unrouted", json!({})).await.unwrap_err();
    assert!(matches!(error, ToolError::InvalidOperation { .. }));
}

#[tokio::test]
async fn test_non_object_arguments_are_rejected() {
    let executor = executor().await;

    let error = executor.execute("list_missions", json!([1, 2])).await.unwrap_err();

    assert!(matches!(error, ToolError::Validation { .. }));
}

#[tokio::test]
async fn test_bearer_token_is_forwarded() {
    let executor = executor().await.with_bearer_token("secret-token");

    let payload = executor.execute("whoami", json!({})).await.unwrap();

    assert_eq!(payload["authorization"], json!("Bearer secret-token"));
}

#[tokio::test]
async fn test_stdio_tools_call_through_backend() {
    let executor = executor().await;
    let transport = StdioTransport::new(Dispatcher::default(), Arc::new(executor));
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_mission","arguments":{"missionId":"9"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"create_mission","arguments":{}}}"#,
        "\n",
    );
    let mut output = Vec::new();

    transport
        .run(input.as_bytes(), &mut output, CancellationToken::new())
        .await
        .unwrap();

    let responses: Vec<Value> = std::str::from_utf8(&output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);

    let found = &responses[0]["result"];
    assert_eq!(found["isError"], json!(false));
    let payload: Value = serde_json::from_str(found["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload["id"], json!("9"));

    let rejected = &responses[1]["result"];
    assert_eq!(rejected["isError"], json!(true));
    let payload: Value =
        serde_json::from_str(rejected["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload["tool"], json!("create_mission"));
    assert_eq!(payload["statusCode"], json!(400));
    assert_eq!(payload["errors"]["Name"], json!(["The Name field is required."]));
}
