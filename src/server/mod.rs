//! Server state and MCP handler wiring.

pub mod handler;
pub mod state;

pub use handler::McpHandler;
pub use state::{ServerState, ServerStateBuilder};
