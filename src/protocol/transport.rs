//! Stdio transport for JSON-RPC messages.

use crate::error::{McpError, Result};
use crate::protocol::codec;
use crate::protocol::types::{JsonRpcResponse, Message};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, error, trace};

/// Transport trait for MCP communication.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn read_message(&self) -> Result<Option<Message>>;
    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()>;
}

/// Stdio-based transport: one JSON message per line.
pub struct StdioTransport {
    reader: Arc<Mutex<BufReader<Stdin>>>,
    writer: Arc<Mutex<Stdout>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()))),
            writer: Arc::new(Mutex::new(tokio::io::stdout())),
        }
    }

    /// Read the next non-blank line from stdin. `None` on EOF.
    async fn read_line(&self) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => return Ok(None), // EOF
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    trace!("Received line: {}", trimmed);
                    return Ok(Some(trimmed.to_string()));
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    return Err(McpError::Io(e));
                }
            }
        }
    }

    /// Write a line to stdout.
    async fn write_line(&self, content: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        trace!("Sending line: {}", content);
        writer.write_all(content.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for StdioTransport {
    async fn read_message(&self) -> Result<Option<Message>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        let message = codec::decode_message(&line).map_err(McpError::Protocol)?;
        if let Message::Request(request) = &message {
            debug!("Received request: method={}", request.method);
        }
        Ok(Some(message))
    }

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let json = codec::encode(response).map_err(McpError::Protocol)?;
        debug!("Sending response: id={:?}", response.id);
        self.write_line(&json).await
    }
}
