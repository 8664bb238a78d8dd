/// Main entry point for the mission MCP server
///
/// This file sets up logging, parses command line arguments, and starts the
/// MCP server on the chosen transport. Logs always go to stderr because
/// stdout carries the stdio protocol.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mission_mcp::{default_catalog_path, HttpConfig, MissionMcpServer, ServerConfig};

/// Command line arguments for the mission MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pre-built tool catalog (JSON)
    /// If not provided, uses <config dir>/mission-mcp/tools.json
    #[arg(long, global = true, env = "MISSION_MCP_CATALOG")]
    catalog: Option<PathBuf>,

    /// Base URL of the mission backend API
    #[arg(
        long,
        global = true,
        env = "MISSION_MCP_BACKEND_URL",
        default_value = "http://localhost:5000/"
    )]
    backend_url: Url,

    /// Bearer token sent to the backend
    #[arg(long, global = true, env = "MISSION_MCP_BACKEND_TOKEN", hide_env_values = true)]
    backend_token: Option<String>,

    /// Timeout for a single backend call, in seconds
    #[arg(long, global = true, env = "MISSION_MCP_TOOL_TIMEOUT_SECS", default_value_t = 30)]
    tool_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    transport: Transport,
}

#[derive(Subcommand, Debug)]
enum Transport {
    /// Serve MCP over stdin/stdout
    Stdio,

    /// Serve MCP over HTTP with session affinity
    Http {
        /// Address to listen on
        #[arg(long, env = "MISSION_MCP_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Idle seconds before a session expires
        #[arg(long, env = "MISSION_MCP_SESSION_TTL_SECS", default_value_t = 3600)]
        session_ttl_secs: u64,

        /// Seconds between sweeps of expired sessions
        #[arg(long, default_value_t = 60)]
        sweep_interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mission_mcp={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Send logs to stderr, not stdout
        .init();

    info!("Starting mission MCP server");

    let config = ServerConfig {
        backend_token: args.backend_token,
        tool_timeout: Duration::from_secs(args.tool_timeout_secs),
        ..ServerConfig::new(
            args.catalog.unwrap_or_else(default_catalog_path),
            args.backend_url,
        )
    };
    let server = MissionMcpServer::new(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            ctrl_c.cancel();
        }
    });

    match args.transport {
        Transport::Stdio => server.run_stdio(cancel).await?,
        Transport::Http {
            bind,
            session_ttl_secs,
            sweep_interval_secs,
        } => {
            let http = HttpConfig {
                bind,
                session_ttl: Duration::from_secs(session_ttl_secs),
                sweep_interval: Duration::from_secs(sweep_interval_secs),
            };
            server.run_http(http, cancel).await?
        }
    }

    info!("Mission MCP server shutdown complete");
    Ok(())
}
