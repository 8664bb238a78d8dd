/// Tool executor backed by the mission REST API
///
/// Each tool in the catalog may carry a route (`GET /missions/{missionId}`).
/// Executing the tool fills the path placeholders from the arguments, sends
/// the remaining arguments as query string or JSON body, and maps the
/// backend's response onto the bounded `ToolError` kinds.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::tools::{
    ApiRoute, HttpMethod, ProblemDetails, ToolCatalog, ToolDefinition, ToolError, ToolExecutor,
};

/// Problem body as returned by the backend on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ProblemBody {
    status: Option<u16>,
    title: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Executes catalog tools by calling the backend over HTTP
#[derive(Debug, Clone)]
pub struct BackendToolExecutor {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
    timeout: Duration,
    catalog: ToolCatalog,
}

impl BackendToolExecutor {
    pub fn new(catalog: ToolCatalog, base_url: Url, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            bearer_token: None,
            timeout,
            catalog,
        }
    }

    /// Send `Authorization: Bearer <token>` on every backend call
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Build the request URL, consuming path arguments from `args`
    fn build_url(&self, route: &ApiRoute, args: &mut Map<String, Value>) -> Result<Url, ToolError> {
        let mut missing = ProblemDetails::default();
        let mut segments = Vec::new();
        for segment in route.path.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => match args.remove(param).as_ref().and_then(scalar_to_string) {
                    Some(value) => segments.push(value),
                    None => missing = missing.field_error(param, "Path parameter is required"),
                },
                None => segments.push(segment.to_string()),
            }
        }

        if !missing.errors.is_empty() {
            let fields: Vec<_> = missing.errors.keys().cloned().collect();
            return Err(ToolError::Validation {
                message: format!("Missing required path parameter(s): {}", fields.join(", ")),
                details: missing,
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ToolError::invalid_operation(format!(
                    "Backend URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl ToolExecutor for BackendToolExecutor {
    fn list_tools(&self) -> &[ToolDefinition] {
        self.catalog.definitions()
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| ToolError::invalid_operation(format!("Unknown tool: {}", name)))?;
        let route = entry.route.as_ref().ok_or_else(|| {
            ToolError::invalid_operation(format!("Tool '{}' is not bound to a backend route", name))
        })?;

        let mut args = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(ToolError::validation("Tool arguments must be a JSON object")),
        };

        let url = self.build_url(route, &mut args)?;
        tracing::debug!("Calling backend {} {} for tool '{}'", route.method, url, name);

        let mut request = self
            .client
            .request(to_reqwest_method(route.method), url.clone())
            .timeout(self.timeout);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if route.method.has_body() {
            request = request.json(&Value::Object(args));
        } else if !args.is_empty() {
            request = request.query(&query_pairs(&args));
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if status.is_success() {
            return Ok(parse_payload(&body));
        }

        let details = parse_problem(status.as_u16(), &body);
        let message = format!("Backend returned {} for {} {}", status, route.method, url.path());
        match status.as_u16() {
            400 | 422 => Err(ToolError::Validation { message, details }),
            _ => Err(ToolError::Transport { message, details }),
        }
    }
}

impl BackendToolExecutor {
    fn request_error(&self, error: reqwest::Error) -> ToolError {
        if error.is_timeout() {
            ToolError::Timeout {
                message: format!("Backend request timed out after {:?}", self.timeout),
            }
        } else {
            ToolError::Transport {
                message: format!("Backend request failed: {}", error),
                details: ProblemDetails::default(),
            }
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten arguments into query pairs; arrays repeat the key
fn query_pairs(args: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in args {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    let text = scalar_to_string(item).unwrap_or_else(|| item.to_string());
                    pairs.push((key.clone(), text));
                }
            }
            other => {
                let text = scalar_to_string(other).unwrap_or_else(|| other.to_string());
                pairs.push((key.clone(), text));
            }
        }
    }
    pairs
}

fn parse_payload(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn parse_problem(status: u16, body: &str) -> ProblemDetails {
    match serde_json::from_str::<ProblemBody>(body) {
        Ok(problem) => ProblemDetails {
            status_code: Some(problem.status.unwrap_or(status)),
            title: problem.title,
            detail: problem.detail,
            errors: problem.errors,
        },
        Err(_) => {
            let text = body.trim();
            ProblemDetails {
                detail: (!text.is_empty()).then(|| text.to_string()),
                ..ProblemDetails::with_status(status)
            }
        }
    }
}
