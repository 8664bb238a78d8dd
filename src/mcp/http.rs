/// MCP over HTTP request/response with session affinity
///
/// Every `POST /mcp` carries one JSON-RPC message. Sessions are created by
/// `initialize` and named by the `MCP-SessionResponse-Id` header, which the
/// server echoes on every response that resolved a session.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::mcp::dispatcher::{Dispatcher, Method};
use crate::mcp::protocol::{parse_request_value, JsonRpcRequest, JsonRpcResponse, ParseError};
use crate::session::{Session, SessionError, SessionStore};

/// Session header, used on both requests and responses
pub static SESSION_HEADER: HeaderName = HeaderName::from_static("mcp-sessionresponse-id");

/// State shared by all HTTP requests
#[derive(Clone)]
pub struct HttpState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<dyn SessionStore>,
}

impl HttpState {
    pub fn new(dispatcher: Dispatcher, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            sessions,
        }
    }
}

/// Routes served by the HTTP transport
pub fn make_router(state: HttpState) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_mcp(State(state): State<HttpState>, headers: HeaderMap, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Rejecting malformed JSON body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": format!("Invalid JSON body: {}", e) })),
            )
                .into_response();
        }
    };

    let request = match parse_request_value(value) {
        Ok(request) => request,
        Err(error) => {
            let id = match &error {
                ParseError::MissingMethod { id } => id.clone().unwrap_or(Value::Null),
                ParseError::InvalidJson(_) => Value::Null,
            };
            return envelope(JsonRpcResponse::error(&id, error.to_string()), None);
        }
    };
    debug!("HTTP request for method '{}'", request.method);

    let session = match resolve_session(&state, &request, &headers).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Session rejected for '{}': {}", request.method, e);
            return match &request.id {
                Some(id) => envelope(JsonRpcResponse::error(id, e.to_string()), None),
                None => no_content(None),
            };
        }
    };

    let outcome = state
        .dispatcher
        .dispatch(&request, session.executor())
        .await;
    let session_id = Some(session.id());

    match (request.id, outcome) {
        (Some(id), Ok(Some(result))) => envelope(JsonRpcResponse::success(&id, result), session_id),
        (Some(id), Err(e)) => {
            warn!("Request '{}' failed: {}", request.method, e);
            envelope(JsonRpcResponse::error(&id, e.to_string()), session_id)
        }
        (None, Err(e)) => {
            warn!("Notification '{}' failed: {}", request.method, e);
            no_content(session_id)
        }
        _ => no_content(session_id),
    }
}

/// Find or create the session this request belongs to
async fn resolve_session(
    state: &HttpState,
    request: &JsonRpcRequest,
    headers: &HeaderMap,
) -> Result<Arc<Session>, SessionError> {
    let requested = session_header(headers)?;

    if request.method == Method::Initialize.name() {
        return Ok(state.sessions.get_or_create(requested).await);
    }

    let id = requested.ok_or(SessionError::HeaderRequired)?;
    state
        .sessions
        .get_existing(id)
        .await
        .ok_or(SessionError::NotFound(id))
}

/// Parse the optional session header; blank counts as absent
fn session_header(headers: &HeaderMap) -> Result<Option<Uuid>, SessionError> {
    let Some(value) = headers.get(&SESSION_HEADER) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| SessionError::InvalidHeader)?
        .trim();
    if text.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(text)
        .map(Some)
        .map_err(|_| SessionError::InvalidHeader)
}

fn envelope(response: JsonRpcResponse, session_id: Option<Uuid>) -> Response {
    with_session_header(Json(response).into_response(), session_id)
}

fn no_content(session_id: Option<Uuid>) -> Response {
    with_session_header(StatusCode::NO_CONTENT.into_response(), session_id)
}

fn with_session_header(mut response: Response, session_id: Option<Uuid>) -> Response {
    if let Some(id) = session_id {
        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            response.headers_mut().insert(SESSION_HEADER.clone(), value);
        }
    }
    response
}
