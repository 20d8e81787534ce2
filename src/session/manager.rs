//! Session manager for the streamable HTTP transport.
//!
//! A session is created when a client first talks to the server without
//! presenting a session header, lives across any number of physical
//! connections, and is destroyed by an explicit DELETE or the idle
//! sweeper. Lifecycle is Handshaking -> Active -> Terminating -> Closed;
//! the first and last transitions are atomic here (creation inserts an
//! Active session, termination cancels and removes in one step), so only
//! Active sessions are ever observable in the table.

use crate::error::{SessionError, SessionResult};
use crate::protocol::codec;
use crate::protocol::types::JsonRpcRequest;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Opaque session identifier.
///
/// A v4 UUID: 122 bits of entropy, no embedded session data. Never
/// reused after termination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logical client session.
pub struct Session {
    id: SessionId,
    created_at: Instant,
    last_activity: Mutex<Instant>,
    cancel: CancellationToken,
    /// At most one push stream per session (serialized notifications).
    push: Mutex<Option<mpsc::Sender<String>>>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_activity: Mutex::new(now),
            cancel: CancellationToken::new(),
            push: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Record activity, resetting the idle clock.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Token cancelled when the session terminates. In-flight requests
    /// run under child tokens of this one.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Attach a push-stream sink.
    ///
    /// A second stream is rejected while the attached one is live; a
    /// sink whose receiver has gone away is replaced silently.
    pub fn attach_stream(&self, sender: mpsc::Sender<String>) -> SessionResult<()> {
        let mut push = self.push.lock();
        if let Some(existing) = push.as_ref() {
            if !existing.is_closed() {
                return Err(SessionError::StreamAlreadyOpen(self.id.to_string()));
            }
            debug!(session_id = %self.id, "Replacing disconnected push stream");
        }
        *push = Some(sender);
        Ok(())
    }

    pub fn detach_stream(&self) {
        *self.push.lock() = None;
    }

    pub fn has_stream(&self) -> bool {
        self.push
            .lock()
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// Push a notification onto the session's event stream, if one is
    /// attached. Returns false when no live stream accepted it.
    pub async fn push_notification(&self, notification: &JsonRpcRequest) -> bool {
        let sender = match self.push.lock().as_ref() {
            Some(tx) if !tx.is_closed() => tx.clone(),
            _ => return false,
        };

        let encoded = match codec::encode(notification) {
            Ok(s) => s,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Failed to encode push notification");
                return false;
            }
        };

        if sender.send(encoded).await.is_err() {
            // Receiver dropped mid-send: client disconnected.
            self.detach_stream();
            return false;
        }
        true
    }
}

/// Owner of the session table.
pub struct SessionManager {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Allocate a fresh session.
    pub fn create(&self) -> Arc<Session> {
        let id = SessionId::generate();
        let session = Arc::new(Session::new(id.clone()));
        self.sessions.insert(id.clone(), Arc::clone(&session));
        info!(session_id = %id, "Session created");
        session
    }

    /// Look up a live session by identifier.
    pub fn get(&self, id: &str) -> SessionResult<Arc<Session>> {
        self.sessions
            .get(&SessionId::from(id))
            .map(|entry| Arc::clone(&*entry))
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Terminate a session: cancel its in-flight requests (via the
    /// token cascade) and drop its push stream. The identifier is dead
    /// afterwards; presenting it again yields `SessionNotFound`.
    pub fn terminate(&self, id: &str) -> SessionResult<()> {
        let (_, session) = self
            .sessions
            .remove(&SessionId::from(id))
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        session.cancel.cancel();
        session.detach_stream();
        info!(session_id = %id, "Session terminated");
        Ok(())
    }

    /// Tear down sessions idle longer than `idle_timeout`. Same path as
    /// explicit termination. Returns the number of sessions removed.
    pub fn sweep_idle(&self, idle_timeout: Duration) -> usize {
        let expired: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() > idle_timeout)
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            if self.terminate(id.as_str()).is_ok() {
                debug!(session_id = %id, "Idle session swept");
            }
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
