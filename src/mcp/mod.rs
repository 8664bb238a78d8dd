/// MCP protocol implementation
///
/// This module handles the Model Context Protocol communication: JSON-RPC
/// parsing, method routing, and the HTTP and stdio transports.

pub mod dispatcher;
pub mod framing;
pub mod http;
pub mod protocol;
pub mod stdio;

// Re-export main types
pub use dispatcher::{DispatchError, Dispatcher, Method};
pub use framing::{Framing, FramingError, InboundMessage};
pub use http::{make_router, HttpState, SESSION_HEADER};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, ParseError, ServerInfo, MCP_VERSION};
pub use stdio::StdioTransport;
