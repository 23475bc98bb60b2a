//! Session store abstraction
//!
//! The store is injected into the orchestrator rather than living in a
//! module-level table, so its lifetime and concurrency policy stay explicit
//! and the orchestrator can be tested against a store it owns.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::session::Session;

/// Keyed access to session state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id, if one exists
    async fn get(&self, session_id: &str) -> Option<Session>;

    /// Insert or replace a session under its own id
    async fn put(&self, session: Session);

    /// Remove a session. Removing an unknown id is a no-op.
    async fn remove(&self, session_id: &str);
}

/// In-process session store backed by a read-write locked map.
///
/// Distinct sessions are keyed independently; a given end-user is expected
/// to have at most one in-flight message at a time, so per-session races
/// are out of scope here.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn put(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }

    async fn remove(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoleId;

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = InMemorySessionStore::new();
        assert!(store.get("s1").await.is_none());

        let mut session = Session::new("s1");
        session.current_role = Some(RoleId::DataAnalyst);
        store.put(session).await;

        let loaded = store.get("s1").await.unwrap();
        assert_eq!(loaded.current_role, Some(RoleId::DataAnalyst));

        store.remove("s1").await;
        assert!(store.get("s1").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_unknown_is_noop() {
        let store = InMemorySessionStore::new();
        store.remove("nope").await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = InMemorySessionStore::new();
        store.put(Session::new("s1")).await;

        let mut updated = Session::new("s1");
        updated.push_user("hello");
        store.put(updated).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("s1").await.unwrap().history.len(), 1);
    }
}
