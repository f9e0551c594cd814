//! Scope resolution and guarded handler invocation for resources/read.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::RwLock;

use crate::resources::{MatchedEntry, Resolution, ResourceRegistry, SharedHandler};
use crate::session::SessionManager;
use crate::types::{
    Arguments, McpError, McpResult, ReadResourceRequest, ReadResourceResult, ResourceContent,
};

use super::context::RequestContext;

/// Where a resolved handler was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Session(String),
    Global,
}

/// The outcome of scope resolution, detached from every registry lock.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub scope: Scope,
    pub resolution: Resolution,
}

impl Resolved {
    pub fn handler(&self) -> &SharedHandler {
        &self.resolution.handler
    }

    pub fn arguments(&self) -> &Arguments {
        &self.resolution.arguments
    }

    pub fn matched(&self) -> &MatchedEntry {
        &self.resolution.matched
    }
}

/// Resolves a URI against session scope, then global scope, and runs the
/// winning handler.
///
/// Policy: a context naming an unknown or unregistered session fails with
/// `SessionNotFound`. A registered session without a match falls through to
/// the global registry. A session match always shadows the global registry.
#[derive(Debug, Clone)]
pub struct DispatchRouter {
    global: Arc<RwLock<ResourceRegistry>>,
    sessions: Arc<SessionManager>,
    default_timeout: Option<Duration>,
}

impl DispatchRouter {
    pub fn new(global: Arc<RwLock<ResourceRegistry>>, sessions: Arc<SessionManager>) -> Self {
        Self {
            global,
            sessions,
            default_timeout: None,
        }
    }

    /// Deadline applied when the request context does not carry one.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Find the handler for `uri` in the scopes visible to `ctx`.
    pub async fn resolve(&self, ctx: &RequestContext, uri: &str) -> McpResult<Resolved> {
        if let Some(session_id) = ctx.session_id() {
            let hit = self
                .sessions
                .with_session(session_id, |session| session.registry().resolve(uri))
                .await?;
            if let Some(resolution) = hit {
                tracing::debug!(
                    session_id = %session_id,
                    uri = %uri,
                    matched = ?resolution.matched,
                    "Resolved in session scope"
                );
                return Ok(Resolved {
                    scope: Scope::Session(session_id.to_string()),
                    resolution,
                });
            }
        }

        let hit = self.global.read().await.resolve(uri);
        match hit {
            Some(resolution) => {
                tracing::debug!(uri = %uri, matched = ?resolution.matched, "Resolved in global scope");
                Ok(Resolved {
                    scope: Scope::Global,
                    resolution,
                })
            }
            None => Err(McpError::ResourceNotFound(uri.to_string())),
        }
    }

    /// Run a resolved handler on the caller's task. This is the single fault
    /// boundary: handler errors become `HandlerError`, panics become
    /// `InternalFault`, and cancellation or an elapsed deadline returns
    /// promptly with the handler future dropped.
    pub async fn invoke(
        &self,
        resolved: Resolved,
        ctx: &RequestContext,
        uri: &str,
    ) -> McpResult<Vec<ResourceContent>> {
        let request = ReadResourceRequest {
            uri: uri.to_string(),
            arguments: resolved.resolution.arguments,
        };
        let handler = resolved.resolution.handler;

        let future = std::panic::catch_unwind(AssertUnwindSafe(|| {
            handler.read(ctx.clone(), request)
        }))
        .map_err(|payload| fault(uri, payload))?;

        let guarded = AssertUnwindSafe(future).catch_unwind();
        let deadline = ctx.timeout().or(self.default_timeout);
        let run = async {
            match deadline {
                Some(limit) => tokio::time::timeout(limit, guarded)
                    .await
                    .map_err(|_| McpError::RequestTimeout(limit.as_millis() as u64)),
                None => Ok(guarded.await),
            }
        };

        let token = ctx.cancellation_token();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(McpError::RequestCancelled),
            outcome = run => outcome,
        };

        match outcome {
            Ok(Ok(Ok(contents))) => Ok(contents),
            Ok(Ok(Err(e))) => {
                tracing::debug!(uri = %uri, error = %e, "Resource handler returned error");
                Err(McpError::HandlerError(format!("{e:#}")))
            }
            Ok(Err(payload)) => Err(fault(uri, payload)),
            Err(e) => {
                tracing::debug!(uri = %uri, error = %e, "Resource read abandoned");
                Err(e)
            }
        }
    }

    /// Resolve and invoke in one step.
    pub async fn read(&self, ctx: &RequestContext, uri: &str) -> McpResult<ReadResourceResult> {
        let resolved = self.resolve(ctx, uri).await?;
        let contents = self.invoke(resolved, ctx, uri).await?;
        Ok(ReadResourceResult { contents })
    }
}

fn fault(uri: &str, payload: Box<dyn Any + Send>) -> McpError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(uri = %uri, panic = %message, "Resource handler panicked");
    McpError::InternalFault(message)
}
