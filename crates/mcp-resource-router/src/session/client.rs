//! Per-session state: private registry plus outbound notification queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::resources::ResourceRegistry;
use crate::types::{JsonRpcNotification, McpError, McpResult};

/// Receiving half of a session's notification channel.
pub type NotificationReceiver = mpsc::Receiver<JsonRpcNotification>;

/// A registered client session. Always accessed through the session's own
/// lock, which therefore guards both the registry and the channel.
#[derive(Debug)]
pub struct ClientSession {
    id: String,
    initialized: bool,
    registered_at: DateTime<Utc>,
    registry: ResourceRegistry,
    /// `None` once the session is unregistered.
    notifications: Option<mpsc::Sender<JsonRpcNotification>>,
    overflow: Arc<AtomicU64>,
    dropped: u64,
}

impl ClientSession {
    pub(crate) fn new(
        id: String,
        capacity: usize,
        overflow: Arc<AtomicU64>,
    ) -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let session = Self {
            id,
            initialized: false,
            registered_at: Utc::now(),
            registry: ResourceRegistry::new(),
            notifications: Some(tx),
            overflow,
            dropped: 0,
        };
        (session, rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// False once the session has been unregistered; an `Arc` obtained
    /// before unregistration may still point at a closed session.
    pub fn is_open(&self) -> bool {
        self.notifications.is_some()
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// Notifications this session failed to enqueue because its channel was
    /// full.
    pub fn dropped_notifications(&self) -> u64 {
        self.dropped
    }

    /// Enqueue without blocking. A full channel leaves the queue untouched,
    /// bumps the overflow counters and reports `NotificationOverflow`.
    pub fn notify(&mut self, notification: JsonRpcNotification) -> McpResult<()> {
        let tx = self
            .notifications
            .as_ref()
            .ok_or_else(|| McpError::SessionNotFound(self.id.clone()))?;

        match tx.try_send(notification) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                self.dropped += 1;
                self.overflow.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    session_id = %self.id,
                    method = %dropped.method,
                    dropped = self.dropped,
                    "Notification channel full"
                );
                Err(McpError::NotificationOverflow(self.id.clone()))
            }
            Err(TrySendError::Closed(_)) => Err(McpError::Transport(format!(
                "notification receiver for session {} was dropped",
                self.id
            ))),
        }
    }

    /// Drop the sender so the receiver observes end-of-stream, and discard the
    /// private registry.
    pub(crate) fn close(&mut self) {
        self.notifications = None;
        self.registry = ResourceRegistry::new();
    }
}
