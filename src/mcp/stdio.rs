/// MCP server over a byte stream (normally stdin/stdout)
///
/// This module runs the read-dispatch-write loop:
/// 1. Reads one message in whatever framing the peer uses
/// 2. Dispatches it against the connection's tool executor
/// 3. Writes the response, if any, in the framing just read
///
/// Messages are handled strictly one at a time.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::framing::{self, InboundMessage};
use crate::mcp::protocol::{error_codes, parse_request, JsonRpcResponse, ParseError};
use crate::tools::ToolExecutor;
use crate::ServerError;

/// Stdio transport bound to a single tool executor for its whole lifetime
pub struct StdioTransport {
    dispatcher: Dispatcher,
    executor: Arc<dyn ToolExecutor>,
}

impl StdioTransport {
    pub fn new(dispatcher: Dispatcher, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            dispatcher,
            executor,
        }
    }

    /// Serve until end of stream or cancellation
    ///
    /// Framing errors (bad Content-Length, stream closed mid-message) end
    /// the connection with an error.
    pub async fn run<R, W>(
        &self,
        reader: R,
        writer: &mut W,
        cancel: CancellationToken,
    ) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP stdio transport, waiting for JSON-RPC requests...");
        let mut reader = BufReader::new(reader);

        loop {
            if cancel.is_cancelled() {
                info!("MCP stdio transport cancelled");
                break;
            }

            let inbound = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("MCP stdio transport cancelled");
                    break;
                }
                read = framing::read_message(&mut reader) => read,
            };

            let InboundMessage { payload, framing: mode } = match inbound {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("MCP stdio transport shutting down (stream closed)");
                    break;
                }
                Err(e) => {
                    error!("Failed to read MCP message: {}", e);
                    return Err(e.into());
                }
            };

            if let Some(response) = self.handle_payload(&payload).await {
                let body = serde_json::to_vec(&response)?;
                framing::write_message(writer, &body, mode).await?;
                debug!("Sent response ({:?} framing, {} bytes)", mode, body.len());
            }
        }

        Ok(())
    }

    /// Process one message body; `None` means nothing is written back
    pub async fn handle_payload(&self, payload: &[u8]) -> Option<JsonRpcResponse> {
        let request = match parse_request(payload) {
            Ok(request) => request,
            Err(ParseError::InvalidJson(e)) => {
                warn!("Ignoring message that is not valid JSON: {}", e);
                return None;
            }
            Err(ParseError::MissingMethod { .. }) => {
                debug!("Ignoring message without a method");
                return None;
            }
        };

        let outcome = self
            .dispatcher
            .dispatch(&request, self.executor.as_ref())
            .await;

        let Some(id) = request.id else {
            if let Err(e) = outcome {
                warn!("Notification '{}' failed: {}", request.method, e);
            }
            return None;
        };

        match outcome {
            Ok(Some(result)) => Some(JsonRpcResponse::success(&id, result)),
            Ok(None) => None,
            Err(e) => {
                error!("Request '{}' failed: {}", request.method, e);
                Some(JsonRpcResponse::error_with_code(
                    &id,
                    e.to_string(),
                    error_codes::INTERNAL_ERROR,
                ))
            }
        }
    }
}
