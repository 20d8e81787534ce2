//! Error types for the MCP server.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` conversions.

use std::borrow::Cow;
use thiserror::Error;

/// Main error type for the Marvel MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Marvel API error: {0}")]
    Marvel(#[from] MarvelError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON-RPC 2.0 and MCP protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Parse error: invalid JSON")]
    ParseError,

    #[error("Invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(Cow<'static, str>),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Error processing {tool}: {message}")]
    HandlerFailed { tool: String, message: String },

    #[error("Internal error: {0}")]
    InternalError(Cow<'static, str>),

    #[error("Request cancelled")]
    Cancelled,
}

impl ProtocolError {
    /// Returns the JSON-RPC 2.0 error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::UnknownTool(_) => -32602,
            Self::HandlerFailed { .. } => -32603,
            Self::InternalError(_) => -32603,
            Self::Cancelled => -32800,
        }
    }
}

/// Errors from the Marvel catalog API client.
#[derive(Debug, Error)]
pub enum MarvelError {
    #[error("Marvel API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for MarvelError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.to_string())
    }
}

/// Session lifecycle errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session {0} already has an active event stream")]
    StreamAlreadyOpen(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(Cow<'static, str>),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Environment variable not found: {0}")]
    EnvNotFound(String),
}

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result type alias for McpError.
pub type Result<T> = std::result::Result<T, McpError>;

/// Result type alias for ProtocolError.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Result type alias for MarvelError.
pub type MarvelResult<T> = std::result::Result<T, MarvelError>;

/// Result type alias for SessionError.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        assert_eq!(ProtocolError::ParseError.code(), -32700);
        assert_eq!(ProtocolError::InvalidRequest("test".into()).code(), -32600);
        assert_eq!(ProtocolError::MethodNotFound("test".into()).code(), -32601);
        assert_eq!(ProtocolError::InvalidParams("test".into()).code(), -32602);
        assert_eq!(ProtocolError::UnknownTool("test".into()).code(), -32602);
        assert_eq!(ProtocolError::Cancelled.code(), -32800);
    }

    #[test]
    fn test_handler_failed_message() {
        let err = ProtocolError::HandlerFailed {
            tool: "get_comics".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Error processing get_comics: boom");
        assert_eq!(err.code(), -32603);
    }

    #[test]
    fn test_error_conversion() {
        let marvel_error = MarvelError::Api {
            status: 404,
            body: "not found".into(),
        };
        let mcp_error: McpError = marvel_error.into();
        assert!(matches!(mcp_error, McpError::Marvel(_)));
    }
}
