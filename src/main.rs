//! MCP server binary entry point.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use marvel_mcp::{
    config::{HttpConfig, MarvelConfigBuilder, ServerConfig},
    http::{self, HttpServerState},
    protocol::{Dispatcher, McpServer, ServerInfo},
    server::{McpHandler, ServerStateBuilder},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// One JSON message per line over stdin/stdout.
    Stdio,
    /// Streamable HTTP with server-push event streams.
    Http,
}

#[derive(Parser)]
#[command(name = "marvel-mcp", version, about = "Marvel comics catalog MCP server")]
struct Cli {
    /// Transport to serve the protocol on.
    #[arg(long, value_enum, default_value = "stdio")]
    transport: TransportKind,

    /// Bind address for the HTTP transport.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Tear down HTTP sessions idle for this many seconds.
    #[arg(long, default_value_t = 300)]
    idle_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let marvel = MarvelConfigBuilder::new().from_env()?.build()?;
    let http_config = HttpConfig {
        bind: cli.bind,
        idle_timeout: Duration::from_secs(cli.idle_timeout_secs),
        ..HttpConfig::default()
    };
    let config = ServerConfig::builder()
        .marvel(marvel)
        .http(http_config)
        .build();

    let state = Arc::new(ServerStateBuilder::new().config(config).build()?);
    info!("Server state initialized with {} tools", state.tools.len());

    match cli.transport {
        TransportKind::Stdio => {
            let info = ServerInfo {
                name: state.config.name.to_string(),
                version: state.config.version.to_string(),
            };
            let server = McpServer::new(McpHandler::new(state), info);
            info!("MCP server ready on stdio");
            server.run().await?;
        }
        TransportKind::Http => {
            let http_config = state.config.http.clone();
            let handler = McpHandler::new(state);
            let server_state =
                HttpServerState::new(Dispatcher::new(Arc::new(handler)), http_config);
            http::serve(server_state).await?;
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marvel_mcp=info,warn"));

    // Structured logging to stderr; stdout belongs to the line transport.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .json()
        .init();
}
