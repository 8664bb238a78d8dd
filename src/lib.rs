/// Public library interface for the mission MCP server
///
/// This module exports the protocol engine (codec, dispatcher, transports),
/// the session store and the tool execution layer, plus `MissionMcpServer`
/// which wires them together for the binary.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

// Internal modules
pub mod config;
pub mod mcp;
pub mod session;
pub mod tools;

// Re-export public modules and types
pub use config::{default_catalog_path, HttpConfig, ServerConfig};
pub use mcp::{
    make_router, DispatchError, Dispatcher, Framing, FramingError, HttpState, JsonRpcRequest,
    JsonRpcResponse, ServerInfo, StdioTransport, MCP_VERSION, SESSION_HEADER,
};
pub use session::{InMemorySessionStore, Session, SessionError, SessionStore};
pub use tools::{
    BackendToolExecutor, CallToolResult, CatalogError, ProblemDetails, ToolCatalog,
    ToolDefinition, ToolError, ToolExecutor, ToolExecutorFactory,
};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Tool catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MCP server exposing the backend's tool catalog over stdio or HTTP
pub struct MissionMcpServer {
    config: ServerConfig,
    catalog: ToolCatalog,
}

impl MissionMcpServer {
    /// Create a server, loading the tool catalog named in `config`
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Loading tool catalog from {}", config.catalog_path.display());
        let catalog = ToolCatalog::load(&config.catalog_path)?;
        Ok(Self::with_catalog(config, catalog))
    }

    /// Create a server around an already-loaded catalog
    pub fn with_catalog(config: ServerConfig, catalog: ToolCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.config.server_info.clone())
    }

    fn executor(&self) -> BackendToolExecutor {
        let executor = BackendToolExecutor::new(
            self.catalog.clone(),
            self.config.backend_url.clone(),
            self.config.tool_timeout,
        );
        match &self.config.backend_token {
            Some(token) => executor.with_bearer_token(token.clone()),
            None => executor,
        }
    }

    /// Serve MCP over stdin/stdout until stdin closes or `cancel` fires
    pub async fn run_stdio(self, cancel: CancellationToken) -> Result<(), ServerError> {
        tracing::info!(
            "Serving {} tools over stdio (backend {})",
            self.catalog.len(),
            self.config.backend_url
        );

        let transport = StdioTransport::new(self.dispatcher(), Arc::new(self.executor()));
        let mut stdout = tokio::io::stdout();
        transport.run(tokio::io::stdin(), &mut stdout, cancel).await
    }

    /// Serve MCP over HTTP until `cancel` fires
    pub async fn run_http(self, http: HttpConfig, cancel: CancellationToken) -> Result<(), ServerError> {
        let executor = self.executor();
        let factory = move || -> Arc<dyn ToolExecutor> { Arc::new(executor.clone()) };
        let store = Arc::new(InMemorySessionStore::new(Arc::new(factory), http.session_ttl));

        let sweeper = {
            let store = Arc::clone(&store);
            let cancel = cancel.clone();
            // interval() panics on a zero period
            let period = http.sweep_interval.max(std::time::Duration::from_secs(1));
            let mut interval = tokio::time::interval(period);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = interval.tick() => {
                            store.purge_expired();
                        }
                    }
                }
            })
        };

        let state = HttpState::new(self.dispatcher(), store);
        let listener = tokio::net::TcpListener::bind(http.bind).await?;
        tracing::info!(
            "Serving {} tools over HTTP on {} (backend {})",
            self.catalog.len(),
            listener.local_addr()?,
            self.config.backend_url
        );

        let shutdown = cancel.clone();
        axum::serve(listener, make_router(state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        cancel.cancel();
        if let Err(e) = sweeper.await {
            tracing::warn!("Session sweeper task ended abnormally: {}", e);
        }
        tracing::info!("HTTP transport stopped");
        Ok(())
    }
}
