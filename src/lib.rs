//! MCP server for the Marvel comics catalog.
//!
//! Exposes six read-only lookup tools over the Model Context Protocol,
//! reachable over stdio (one JSON message per line) or over streamable
//! HTTP with per-session server-push event streams.
//!
//! # Example
//!
//! ```no_run
//! use marvel_mcp::{
//!     config::{MarvelConfigBuilder, ServerConfig},
//!     protocol::{McpServer, ServerInfo},
//!     server::{McpHandler, ServerStateBuilder},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let marvel = MarvelConfigBuilder::new()
//!         .from_env()?
//!         .build()?;
//!     let config = ServerConfig::builder().marvel(marvel).build();
//!
//!     let state = Arc::new(ServerStateBuilder::new().config(config).build()?);
//!     let info = ServerInfo {
//!         name: state.config.name.to_string(),
//!         version: state.config.version.to_string(),
//!     };
//!
//!     let server = McpServer::new(McpHandler::new(state), info);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod marvel;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use config::{HttpConfig, MarvelConfig, MarvelConfigBuilder, ServerConfig};
pub use error::{McpError, Result};
pub use marvel::MarvelClient;
pub use protocol::{Dispatcher, Handler, McpServer};
pub use server::{McpHandler, ServerState, ServerStateBuilder};
pub use session::{Session, SessionManager};
