//! Per-request call context.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Carries the active session (if any), the request's cancellation token and
/// an optional deadline. Cheap to clone; handlers receive their own copy.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    session_id: Option<String>,
    cancellation: CancellationToken,
    timeout: Option<Duration>,
}

impl RequestContext {
    /// A context with no session, a fresh token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context dispatching under `session_id`.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self::new().with_session(session_id)
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Replace the cancellation token, e.g. with a child of a connection-wide
    /// token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Bound handler execution. Overrides the router's default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Signal cancellation to the in-flight handler.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
