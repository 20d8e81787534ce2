//! Streamable HTTP transport adapter.
//!
//! A single endpoint carries the whole protocol. POST delivers one or
//! more request envelopes and returns their responses in the body; GET
//! upgrades to the session's server-push event stream; DELETE
//! terminates the session. The session identifier travels in the
//! `Mcp-Session-Id` header, never in the body or URL.

use crate::config::HttpConfig;
use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::codec;
use crate::protocol::handler::{Dispatcher, Handler};
use crate::protocol::types::{JsonRpcError, JsonRpcResponse};
use crate::session::SessionManager;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use futures_util::future::join_all;
use futures_util::stream;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Header carrying the session identifier on requests and responses.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// The protocol endpoint path.
pub const ENDPOINT: &str = "/mcp";

/// JSON-RPC error code reported in `SessionNotFound` bodies.
const SESSION_NOT_FOUND_CODE: i32 = -32001;

/// Shared state behind the HTTP handlers.
pub struct HttpServerState<H: Handler> {
    pub dispatcher: Dispatcher<H>,
    pub sessions: Arc<SessionManager>,
    pub config: HttpConfig,
}

impl<H: Handler> Clone for HttpServerState<H> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            sessions: Arc::clone(&self.sessions),
            config: self.config.clone(),
        }
    }
}

impl<H: Handler> HttpServerState<H> {
    pub fn new(dispatcher: Dispatcher<H>, config: HttpConfig) -> Self {
        Self {
            dispatcher,
            sessions: Arc::new(SessionManager::new()),
            config,
        }
    }
}

/// Build the protocol router.
pub fn router<H: Handler + 'static>(state: HttpServerState<H>) -> Router {
    Router::new()
        .route(
            ENDPOINT,
            post(handle_post::<H>)
                .get(handle_get::<H>)
                .delete(handle_delete::<H>),
        )
        .with_state(state)
}

/// Serve the router, sweeping idle sessions until shutdown.
pub async fn serve<H: Handler + 'static>(state: HttpServerState<H>) -> Result<()> {
    let bind = state.config.bind;
    let sessions = Arc::clone(&state.sessions);
    let idle_timeout = state.config.idle_timeout;
    let sweep_interval = state.config.sweep_interval;
    let app = router(state);

    let sweeper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = sessions.sweep_idle(idle_timeout);
            if swept > 0 {
                info!("Swept {} idle session(s)", swept);
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("MCP endpoint: http://{}{}", bind, ENDPOINT);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    result.map_err(McpError::Io)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down server...");
}

/// POST: one or more request envelopes in, matching responses out.
///
/// A request without a session header allocates a fresh session; its
/// identifier is returned in the response header for the client to
/// present on every subsequent request.
async fn handle_post<H: Handler + 'static>(
    State(state): State<HttpServerState<H>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let is_batch = body
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'[')
        .unwrap_or(false);

    let requests = match codec::decode_body(&body) {
        Ok(requests) => requests,
        Err(e) => return protocol_error_response(e),
    };

    let session = match header_session_id(&headers) {
        Some(id) => match state.sessions.get(&id) {
            Ok(session) => session,
            Err(_) => return session_not_found(&id),
        },
        None => state.sessions.create(),
    };
    session.touch();

    debug!(
        session_id = %session.id(),
        requests = requests.len(),
        "Handling POST"
    );

    let dispatches = requests.into_iter().map(|request| {
        let dispatcher = state.dispatcher.clone();
        let session = Arc::clone(&session);
        async move { dispatcher.dispatch(request, &session).await }
    });
    let responses: Vec<JsonRpcResponse> = join_all(dispatches).await.into_iter().flatten().collect();

    let mut http_response = if is_batch {
        if responses.is_empty() {
            StatusCode::ACCEPTED.into_response()
        } else {
            Json(responses).into_response()
        }
    } else {
        match responses.into_iter().next() {
            Some(single) => Json(single).into_response(),
            // Notifications produce no response body.
            None => StatusCode::ACCEPTED.into_response(),
        }
    };

    if let Ok(value) = HeaderValue::from_str(session.id().as_str()) {
        http_response.headers_mut().insert(SESSION_HEADER, value);
    }
    http_response
}

/// GET: upgrade the connection into the session's push stream.
async fn handle_get<H: Handler + 'static>(
    State(state): State<HttpServerState<H>>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = header_session_id(&headers) else {
        return missing_session_header();
    };
    let session = match state.sessions.get(&id) {
        Ok(session) => session,
        Err(_) => return session_not_found(&id),
    };

    let accepts_event_stream = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("text/event-stream") || accept.contains("*/*"))
        .unwrap_or(true);
    if !accepts_event_stream {
        return (
            StatusCode::NOT_ACCEPTABLE,
            "Accept: text/event-stream required",
        )
            .into_response();
    }
    session.touch();

    let (tx, rx) = mpsc::channel::<String>(state.config.push_channel_capacity);
    if let Err(e) = session.attach_stream(tx) {
        // One live stream per session; see Session::attach_stream.
        return (StatusCode::CONFLICT, e.to_string()).into_response();
    }

    debug!(session_id = %session.id(), "Push stream opened");

    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|payload| {
            (
                Ok::<Event, Infallible>(Event::default().event("message").data(payload)),
                rx,
            )
        })
    });

    let mut response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    if let Ok(value) = HeaderValue::from_str(session.id().as_str()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// DELETE: explicit session termination.
async fn handle_delete<H: Handler + 'static>(
    State(state): State<HttpServerState<H>>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = header_session_id(&headers) else {
        return missing_session_header();
    };

    match state.sessions.terminate(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => session_not_found(&id),
    }
}

fn header_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}

fn session_not_found(id: &str) -> Response {
    let body = JsonRpcResponse::error(
        None,
        JsonRpcError::new(
            SESSION_NOT_FOUND_CODE,
            format!("Session not found: {}", id),
        ),
    );
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn missing_session_header() -> Response {
    let body = JsonRpcResponse::error(
        None,
        JsonRpcError::invalid_request("Missing Mcp-Session-Id header"),
    );
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn protocol_error_response(e: ProtocolError) -> Response {
    let body = JsonRpcResponse::error(None, JsonRpcError::new(e.code(), e.to_string()));
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
