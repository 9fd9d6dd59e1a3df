//! Session store for authenticated supervisors
//!
//! A session maps the id carried in our own session token to the
//! evaluations API token obtained at login. The store is injected into the
//! application state; nothing reads session data from ambient globals.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::UserProfile;
use uuid::Uuid;

use crate::external::{TokenProvider, UnauthorizedHandler};

/// An authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub upstream_token: String,
    pub user: UserProfile,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage for sessions, keyed by session id
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &Uuid) -> Option<Session>;
    fn set(&self, session_id: Uuid, session: Session);
    fn clear(&self, session_id: &Uuid);

    /// Drop every session that expired before `now`, returning how many were removed
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;
}

/// Process-local session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &Uuid) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    fn set(&self, session_id: Uuid, session: Session) {
        self.sessions.write().insert(session_id, session);
    }

    fn clear(&self, session_id: &Uuid) {
        self.sessions.write().remove(session_id);
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Supplies the upstream token of one session
pub struct SessionTokenProvider {
    store: Arc<dyn SessionStore>,
    session_id: Uuid,
}

impl SessionTokenProvider {
    pub fn new(store: Arc<dyn SessionStore>, session_id: Uuid) -> Self {
        Self { store, session_id }
    }
}

impl TokenProvider for SessionTokenProvider {
    fn token(&self) -> Option<String> {
        self.store
            .get(&self.session_id)
            .map(|session| session.upstream_token)
    }
}

/// Ends the session when the evaluations API rejects its token
pub struct ClearSessionOnUnauthorized {
    store: Arc<dyn SessionStore>,
    session_id: Uuid,
}

impl ClearSessionOnUnauthorized {
    pub fn new(store: Arc<dyn SessionStore>, session_id: Uuid) -> Self {
        Self { store, session_id }
    }
}

impl UnauthorizedHandler for ClearSessionOnUnauthorized {
    fn on_unauthorized(&self) {
        tracing::info!("Upstream rejected session {}, clearing it", self.session_id);
        self.store.clear(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(token: &str, expires_in_secs: i64) -> Session {
        let now = Utc::now();
        Session {
            upstream_token: token.to_string(),
            user: UserProfile::default(),
            created_at: now,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    #[test]
    fn test_get_set_clear() {
        let store = InMemorySessionStore::new();
        let id = Uuid::new_v4();
        assert!(store.get(&id).is_none());

        store.set(id, session("abc", 60));
        assert_eq!(store.get(&id).unwrap().upstream_token, "abc");

        store.clear(&id);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_purge_expired() {
        let store = InMemorySessionStore::new();
        store.set(Uuid::new_v4(), session("old", -10));
        store.set(Uuid::new_v4(), session("fresh", 600));

        assert_eq!(store.purge_expired(Utc::now()), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_token_provider_follows_store() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let id = Uuid::new_v4();
        let provider = SessionTokenProvider::new(store.clone(), id);
        assert!(provider.token().is_none());

        store.set(id, session("abc", 60));
        assert_eq!(provider.token().as_deref(), Some("abc"));

        ClearSessionOnUnauthorized::new(store.clone(), id).on_unauthorized();
        assert!(provider.token().is_none());
    }
}
