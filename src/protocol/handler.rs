//! Request handler and method dispatcher.

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::*;
use crate::session::{PendingRequests, Session};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Handler trait for processing MCP requests.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle initialize request.
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult>;

    /// Handle initialized notification.
    async fn initialized(&self) -> ProtocolResult<()>;

    /// Handle shutdown request.
    async fn shutdown(&self) -> ProtocolResult<()>;

    /// List available tools, in registration order.
    async fn list_tools(&self) -> ProtocolResult<ListToolsResult>;

    /// Call a tool.
    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult>;

    /// Handle ping request.
    async fn ping(&self) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Method dispatcher that routes envelopes to the handler.
///
/// Owns the pending-request table: every `tools/call` runs under an
/// in-flight slot keyed by (session id, request id), cancelled when the
/// session terminates. Exactly one response is produced per request id;
/// handler failures never escape as panics or bare errors.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
    pending: Arc<PendingRequests>,
}

impl<H: Handler> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            pending: Arc::new(PendingRequests::new()),
        }
    }

    /// The in-flight request table (shared with tests and transports).
    pub fn pending(&self) -> &Arc<PendingRequests> {
        &self.pending
    }

    /// Dispatch one envelope on behalf of a session.
    ///
    /// Returns `None` for notifications, `Some(response)` for requests.
    #[instrument(skip(self, request, session), fields(method = %request.method, session_id = %session.id()))]
    pub async fn dispatch(
        &self,
        request: JsonRpcRequest,
        session: &Arc<Session>,
    ) -> Option<JsonRpcResponse> {
        debug!("Dispatching request: {}", request.method);

        let Some(id) = request.id.clone() else {
            self.dispatch_notification(request, session).await;
            return None;
        };

        if request.method == "tools/call" {
            return Some(self.dispatch_tool_call(id, request.params, session).await);
        }

        // Discovery and lifecycle methods complete without suspension
        // and are not tracked as pending.
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "ping" => self.handler.ping().await,
            "tools/list" => self.handle_list_tools().await,
            "shutdown" => self.handle_shutdown().await,
            method => {
                warn!("Unknown method: {}", method);
                Err(ProtocolError::MethodNotFound(method.to_string()))
            }
        };

        Some(Self::into_response(id, result))
    }

    async fn dispatch_notification(&self, request: JsonRpcRequest, session: &Arc<Session>) {
        match request.method.as_str() {
            "initialized" | "notifications/initialized" => {
                if let Err(e) = self.handler.initialized().await {
                    warn!("initialized notification failed: {}", e);
                }
            }
            "notifications/cancelled" => {
                let Some(params) = request.params else {
                    warn!("cancelled notification without params");
                    return;
                };
                match serde_json::from_value::<CancelledParams>(params) {
                    Ok(cancelled) => {
                        if self.pending.cancel(session.id(), &cancelled.request_id) {
                            debug!(request_id = %cancelled.request_id, "Cancelled in-flight request");
                        } else {
                            debug!(request_id = %cancelled.request_id, "Nothing in flight to cancel");
                        }
                    }
                    Err(e) => warn!("Malformed cancelled notification: {}", e),
                }
            }
            method => debug!("Ignoring notification: {}", method),
        }
    }

    /// Run one tool invocation under an in-flight slot.
    ///
    /// The slot is released after the response is produced, on every
    /// path: success, handler failure, and cancellation.
    async fn dispatch_tool_call(
        &self,
        id: RequestId,
        params: Option<Value>,
        session: &Arc<Session>,
    ) -> JsonRpcResponse {
        let params = match Self::parse_params::<CallToolParams>(params) {
            Ok(params) => params,
            Err(e) => return Self::into_response(id, Err(e)),
        };
        let tool_name = params.name.clone();

        let token = session.cancel_token().child_token();
        if !self.pending.insert(session.id(), &id, token.clone()) {
            let message = format!("Duplicate in-flight request id: {}", id);
            return JsonRpcResponse::error(Some(id), JsonRpcError::invalid_request(message));
        }

        let result = tokio::select! {
            _ = token.cancelled() => Err(ProtocolError::Cancelled),
            result = self.handler.call_tool(params) => result,
        };

        self.pending.remove(session.id(), &id);

        let note = match &result {
            Ok(_) => log_notification(
                LogLevel::Info,
                serde_json::json!({"tool": tool_name, "status": "ok"}),
            ),
            Err(e) => log_notification(
                LogLevel::Warning,
                serde_json::json!({"tool": tool_name, "status": "error", "message": e.to_string()}),
            ),
        };
        // Out-of-band completion note; no-op without an attached stream.
        session.push_notification(&note).await;

        match result {
            Ok(value) => Self::into_response(id, Ok(serde_json::to_value(value).unwrap_or(Value::Null))),
            Err(e) => Self::into_response(id, Err(e)),
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> ProtocolResult<Value> {
        let params: InitializeParams = Self::parse_params(params)?;
        let result = self.handler.initialize(params).await?;
        serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
    }

    async fn handle_list_tools(&self) -> ProtocolResult<Value> {
        let result = self.handler.list_tools().await?;
        serde_json::to_value(result).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
    }

    async fn handle_shutdown(&self) -> ProtocolResult<Value> {
        self.handler.shutdown().await?;
        Ok(Value::Null)
    }

    fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> ProtocolResult<T> {
        params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))?
            .ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))
    }

    fn into_response(id: RequestId, result: ProtocolResult<Value>) -> JsonRpcResponse {
        match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(e) => {
                error!("Request failed: {}", e);
                JsonRpcResponse::error(Some(id), JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionManager;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct MockHandler {
        calls: AtomicU32,
    }

    impl MockHandler {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Handler for MockHandler {
        async fn initialize(&self, _params: InitializeParams) -> ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: MCP_VERSION.into(),
                capabilities: ServerCapabilities::default(),
                server_info: ServerInfo {
                    name: "test".into(),
                    version: "1.0".into(),
                },
                instructions: None,
            })
        }

        async fn initialized(&self) -> ProtocolResult<()> {
            Ok(())
        }

        async fn shutdown(&self) -> ProtocolResult<()> {
            Ok(())
        }

        async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match params.name.as_str() {
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(CallToolResult::text("done"))
                }
                "fail" => Err(ProtocolError::HandlerFailed {
                    tool: params.name,
                    message: "backend exploded".into(),
                }),
                _ => Ok(CallToolResult::text("ok")),
            }
        }
    }

    fn fixture() -> (Dispatcher<MockHandler>, Arc<MockHandler>, SessionManager) {
        let handler = Arc::new(MockHandler::new());
        let dispatcher = Dispatcher::new(Arc::clone(&handler));
        (dispatcher, handler, SessionManager::new())
    }

    fn call(name: &str, id: i64) -> JsonRpcRequest {
        JsonRpcRequest::new("tools/call")
            .with_id(id)
            .with_params(serde_json::json!({"name": name, "arguments": {}}))
    }

    #[tokio::test]
    async fn test_dispatch_initialize() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let request = JsonRpcRequest::new("initialize")
            .with_id(1)
            .with_params(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "1.0"}
            }));

        let response = dispatcher.dispatch(request, &session).await.unwrap();
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let request = JsonRpcRequest::new("unknown/method").with_id(1);
        let response = dispatcher.dispatch(request, &session).await.unwrap();

        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let request = JsonRpcRequest::new("notifications/initialized");
        assert!(dispatcher.dispatch(request, &session).await.is_none());
    }

    #[tokio::test]
    async fn test_tool_call_success_exactly_one_response() {
        let (dispatcher, handler, sessions) = fixture();
        let session = sessions.create();

        let response = dispatcher.dispatch(call("echo", 5), &session).await.unwrap();
        assert_eq!(response.id, Some(RequestId::Number(5)));
        assert!(response.result.is_some());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert!(dispatcher.pending().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_failure_exactly_one_error() {
        let (dispatcher, handler, sessions) = fixture();
        let session = sessions.create();

        let response = dispatcher.dispatch(call("fail", 6), &session).await.unwrap();
        assert_eq!(response.id, Some(RequestId::Number(6)));
        let error = response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("fail"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert!(dispatcher.pending().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_id_rejected() {
        let (dispatcher, handler, sessions) = fixture();
        let session = sessions.create();

        let slow = tokio::spawn({
            let dispatcher = dispatcher.clone();
            let session = Arc::clone(&session);
            async move { dispatcher.dispatch(call("slow", 9), &session).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let response = dispatcher.dispatch(call("echo", 9), &session).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
        // The first request is unaffected by the duplicate.
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        sessions.terminate(&session.id().to_string()).unwrap();
        slow.await.unwrap();
    }

    #[tokio::test]
    async fn test_terminate_cancels_in_flight_requests() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let mut tasks = Vec::new();
        for id in 1..=3 {
            let dispatcher = dispatcher.clone();
            let session = Arc::clone(&session);
            tasks.push(tokio::spawn(async move {
                dispatcher.dispatch(call("slow", id), &session).await
            }));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dispatcher.pending().count_for(session.id()), 3);

        sessions.terminate(&session.id().to_string()).unwrap();

        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert_eq!(response.error.unwrap().code, -32800);
        }
        // No leaked pending entries.
        assert_eq!(dispatcher.pending().count_for(session.id()), 0);
    }

    #[tokio::test]
    async fn test_cancelled_notification_cancels_single_request() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let slow = tokio::spawn({
            let dispatcher = dispatcher.clone();
            let session = Arc::clone(&session);
            async move { dispatcher.dispatch(call("slow", 11), &session).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let cancel = JsonRpcRequest::new("notifications/cancelled")
            .with_params(serde_json::json!({"requestId": 11}));
        assert!(dispatcher.dispatch(cancel, &session).await.is_none());

        let response = slow.await.unwrap().unwrap();
        assert_eq!(response.error.unwrap().code, -32800);
        assert!(dispatcher.pending().is_empty());
        // The session itself is still alive.
        assert!(!session.is_terminated());
    }

    #[tokio::test]
    async fn test_tool_call_completion_pushed_to_stream() {
        let (dispatcher, _, sessions) = fixture();
        let session = sessions.create();

        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        session.attach_stream(tx).unwrap();

        dispatcher.dispatch(call("fail", 2), &session).await.unwrap();

        let raw = rx.recv().await.unwrap();
        assert!(raw.contains("notifications/message"));
        assert!(raw.contains("fail"));
    }
}
