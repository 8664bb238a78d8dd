/// Runtime configuration for the MCP server
///
/// Values come from the command line (see `main.rs`); this module holds the
/// resolved settings and their defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::mcp::ServerInfo;

/// Default per-call backend timeout
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by both transports
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Pre-built tool catalog (JSON)
    pub catalog_path: PathBuf,
    /// Base URL of the mission backend API
    pub backend_url: Url,
    pub backend_token: Option<String>,
    pub tool_timeout: Duration,
    pub server_info: ServerInfo,
}

impl ServerConfig {
    pub fn new(catalog_path: PathBuf, backend_url: Url) -> Self {
        Self {
            catalog_path,
            backend_url,
            backend_token: None,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            server_info: ServerInfo::default(),
        }
    }
}

/// Settings for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind: SocketAddr,
    /// Idle time after which a session is forgotten
    pub session_ttl: Duration,
    /// How often expired sessions are swept
    pub sweep_interval: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            session_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Default catalog location: `<config dir>/mission-mcp/tools.json`
///
/// Falls back to `./tools.json` when the platform has no config directory.
pub fn default_catalog_path() -> PathBuf {
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("mission-mcp");
            path.push("tools.json");
            path
        }
        None => PathBuf::from("tools.json"),
    }
}
