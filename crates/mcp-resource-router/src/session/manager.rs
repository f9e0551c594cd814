//! Session table: registration, lookup and teardown of client sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::types::{McpError, McpResult};

use super::client::{ClientSession, NotificationReceiver};

/// Default bound for each session's notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Shared handle to one session's lock-guarded state.
pub type SessionHandle = Arc<Mutex<ClientSession>>;

/// All registered sessions.
///
/// The table lock is held only long enough to insert, remove or clone a
/// session handle. Everything else happens under the individual session's
/// mutex, so sessions never contend with each other.
#[derive(Debug)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    capacity: usize,
    overflow: Arc<AtomicU64>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl SessionManager {
    /// Create an empty table whose sessions get `capacity`-bounded channels.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity,
            overflow: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register `id`, creating its private registry and notification channel.
    pub async fn register(&self, id: &str) -> McpResult<NotificationReceiver> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(id) {
            return Err(McpError::SessionAlreadyExists(id.to_string()));
        }

        let (session, rx) = ClientSession::new(id.to_string(), self.capacity, self.overflow.clone());
        sessions.insert(id.to_string(), Arc::new(Mutex::new(session)));
        tracing::info!(session_id = %id, active = sessions.len(), "Session registered");
        Ok(rx)
    }

    /// Remove `id`, discarding its registry and closing its channel.
    pub async fn unregister(&self, id: &str) -> McpResult<()> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| McpError::SessionNotFound(id.to_string()))?;

        handle.lock().await.close();
        tracing::info!(session_id = %id, "Session unregistered");
        Ok(())
    }

    /// Clone the handle for `id` without holding the table lock afterwards.
    pub async fn get(&self, id: &str) -> McpResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| McpError::SessionNotFound(id.to_string()))
    }

    /// Run `f` under the session's lock. Fails with `SessionNotFound` if the
    /// session is unknown or was unregistered while the handle was in flight.
    pub async fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ClientSession) -> R,
    ) -> McpResult<R> {
        let handle = self.get(id).await?;
        let mut session = handle.lock().await;
        if !session.is_open() {
            return Err(McpError::SessionNotFound(id.to_string()));
        }
        Ok(f(&mut session))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Registered session ids, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Total notifications rejected because a session's channel was full.
    pub fn overflow_count(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_twice_fails() {
        let manager = SessionManager::default();
        manager.register("s1").await.unwrap();
        let err = manager.register("s1").await.unwrap_err();
        assert!(matches!(err, McpError::SessionAlreadyExists(ref id) if id == "s1"));
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_closes_channel() {
        let manager = SessionManager::new(4);
        let mut rx = manager.register("s1").await.unwrap();
        manager.unregister("s1").await.unwrap();

        assert!(rx.recv().await.is_none());
        assert!(!manager.contains("s1").await);
        assert!(matches!(
            manager.unregister("s1").await,
            Err(McpError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_handle_is_rejected() {
        let manager = SessionManager::default();
        let _rx = manager.register("s1").await.unwrap();
        let handle = manager.get("s1").await.unwrap();
        manager.unregister("s1").await.unwrap();

        assert!(!handle.lock().await.is_open());
        let result = manager.with_session("s1", |s| s.id().to_string()).await;
        assert!(matches!(result, Err(McpError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_reregister_after_unregister() {
        let manager = SessionManager::default();
        let _first = manager.register("s1").await.unwrap();
        manager.unregister("s1").await.unwrap();
        let _second = manager.register("s1").await.unwrap();

        let fresh = manager
            .with_session("s1", |s| s.registry().is_empty())
            .await
            .unwrap();
        assert!(fresh);
    }
}
