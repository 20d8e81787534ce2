//! In-flight request bookkeeping.
//!
//! One entry per (session, request id) for the duration of a single
//! dispatch; the dispatching task inserts before invoking the handler
//! and removes after emitting the response, on every exit path.

use crate::protocol::types::RequestId;
use crate::session::SessionId;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

type PendingKey = (SessionId, RequestId);

/// Table of in-flight tool invocations.
pub struct PendingRequests {
    inflight: DashMap<PendingKey, CancellationToken>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Claim the in-flight slot for a request. Returns false if the
    /// session already has a request with this id in flight.
    pub fn insert(&self, session: &SessionId, id: &RequestId, token: CancellationToken) -> bool {
        match self.inflight.entry((session.clone(), id.clone())) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(token);
                true
            }
        }
    }

    /// Release the slot once the response has been emitted.
    pub fn remove(&self, session: &SessionId, id: &RequestId) {
        self.inflight.remove(&(session.clone(), id.clone()));
    }

    /// Cancel a single in-flight request (`notifications/cancelled`).
    /// Returns false when no such request is in flight.
    pub fn cancel(&self, session: &SessionId, id: &RequestId) -> bool {
        match self.inflight.get(&(session.clone(), id.clone())) {
            Some(entry) => {
                entry.value().cancel();
                true
            }
            None => false,
        }
    }

    /// Number of requests in flight for one session.
    pub fn count_for(&self, session: &SessionId) -> usize {
        self.inflight
            .iter()
            .filter(|entry| entry.key().0 == *session)
            .count()
    }

    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let pending = PendingRequests::new();
        let session = SessionId::generate();
        let id = RequestId::Number(1);

        assert!(pending.insert(&session, &id, CancellationToken::new()));
        assert_eq!(pending.count_for(&session), 1);

        pending.remove(&session, &id);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let pending = PendingRequests::new();
        let session = SessionId::generate();
        let id = RequestId::String("dup".into());

        assert!(pending.insert(&session, &id, CancellationToken::new()));
        assert!(!pending.insert(&session, &id, CancellationToken::new()));

        // Same id on another session is a different slot.
        let other = SessionId::generate();
        assert!(pending.insert(&other, &id, CancellationToken::new()));
    }

    #[test]
    fn test_cancel_fires_token() {
        let pending = PendingRequests::new();
        let session = SessionId::generate();
        let id = RequestId::Number(7);
        let token = CancellationToken::new();

        pending.insert(&session, &id, token.clone());
        assert!(pending.cancel(&session, &id));
        assert!(token.is_cancelled());

        assert!(!pending.cancel(&session, &RequestId::Number(8)));
    }
}
