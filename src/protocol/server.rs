//! MCP server loop for the stdio transport.
//!
//! The process owns a single implicit session for its whole lifetime.
//! Each request is dispatched on its own task, so overlapping handler
//! executions are possible even on this single-consumer transport;
//! correlation ids disambiguate out-of-order responses.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::handler::{Dispatcher, Handler};
use crate::protocol::transport::{StdioTransport, Transport};
use crate::protocol::types::*;
use crate::session::{Session, SessionManager};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

/// Server state enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server created but not initialized.
    Created,
    /// Initialize request received, awaiting initialized notification.
    Initializing,
    /// Server is fully operational.
    Running,
    /// Shutdown requested.
    ShuttingDown,
    /// Server has stopped.
    Stopped,
}

/// MCP server over the line transport.
pub struct McpServer<H: Handler> {
    info: ServerInfo,
    dispatcher: Dispatcher<H>,
    state: Arc<RwLock<ServerState>>,
    running: AtomicBool,
}

impl<H: Handler + 'static> McpServer<H> {
    /// Create a new MCP server.
    pub fn new(handler: H, info: ServerInfo) -> Self {
        Self {
            info,
            dispatcher: Dispatcher::new(Arc::new(handler)),
            state: Arc::new(RwLock::new(ServerState::Created)),
            running: AtomicBool::new(false),
        }
    }

    /// Get current server state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Check if server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the server with stdio transport.
    #[instrument(skip(self), fields(server = %self.info.name))]
    pub async fn run(self) -> Result<()> {
        let transport = Arc::new(StdioTransport::new());
        self.run_with_transport(transport).await
    }

    /// Run the server with a custom transport.
    pub async fn run_with_transport<T: Transport + 'static>(self, transport: Arc<T>) -> Result<()> {
        info!(
            "Starting MCP server: {} v{}",
            self.info.name, self.info.version
        );
        self.running.store(true, Ordering::SeqCst);

        let sessions = SessionManager::new();
        let session = sessions.create();
        let server = Arc::new(self);

        loop {
            if !server.running.load(Ordering::SeqCst) {
                info!("Server stopping...");
                break;
            }

            let message = match transport.read_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Err(McpError::Protocol(ProtocolError::ParseError)) => {
                    // Malformed input must not crash the transport.
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    if let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send error response: {}", e);
                    }
                    continue;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break;
                }
            };

            match message {
                Message::Request(request) => {
                    let method = request.method.clone();
                    server.update_state_for_method(&method).await;

                    if method == "shutdown" {
                        // Handled inline so the loop stops deterministically
                        // after the response is on the wire.
                        Self::dispatch_and_respond(
                            &server.dispatcher,
                            &transport,
                            request,
                            &session,
                        )
                        .await;
                        info!("Shutdown request received");
                        server.running.store(false, Ordering::SeqCst);
                        continue;
                    }

                    // Overlapping handler executions are allowed; each
                    // request answers on its own task.
                    let dispatcher = server.dispatcher.clone();
                    let transport = Arc::clone(&transport);
                    let session = Arc::clone(&session);
                    tokio::spawn(async move {
                        Self::dispatch_and_respond(&dispatcher, &transport, request, &session)
                            .await;
                    });
                }
                Message::Response(response) => {
                    warn!("Unexpected response received: {:?}", response.id);
                }
            }
        }

        // Abandon anything still in flight.
        let _ = sessions.terminate(&session.id().to_string());

        *server.state.write().await = ServerState::Stopped;
        info!("Server stopped");
        Ok(())
    }

    async fn dispatch_and_respond<T: Transport>(
        dispatcher: &Dispatcher<H>,
        transport: &Arc<T>,
        request: JsonRpcRequest,
        session: &Arc<Session>,
    ) {
        if let Some(response) = dispatcher.dispatch(request, session).await {
            if let Err(e) = transport.write_response(&response).await {
                error!("Failed to send response: {}", e);
            }
        }
    }

    /// Update server state based on the method being processed.
    async fn update_state_for_method(&self, method: &str) {
        let mut state = self.state.write().await;
        match method {
            "initialize" => {
                if *state == ServerState::Created {
                    *state = ServerState::Initializing;
                }
            }
            "initialized" | "notifications/initialized" => {
                if *state == ServerState::Initializing {
                    *state = ServerState::Running;
                    info!("Server initialized and running");
                }
            }
            "shutdown" => {
                *state = ServerState::ShuttingDown;
            }
            _ => {}
        }
    }

    /// Stop the server.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
