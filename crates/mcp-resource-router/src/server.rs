//! The resource server: owns the global registry, the session table and the
//! dispatch router.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::dispatch::{DispatchRouter, RequestContext};
use crate::resources::{
    overlay_definitions, shared, ResourceHandler, ResourceRegistry, ResourceTemplate,
    StaticResource,
};
use crate::session::{
    ClientSession, NotificationReceiver, SessionManager, DEFAULT_NOTIFICATION_CAPACITY,
};
use crate::types::{
    resource_updated, resources_list_changed, JsonRpcNotification, McpResult,
    ReadResourceResult, ResourceDefinition, ResourceListResult, ResourceTemplateDefinition,
    ResourceTemplateListResult,
};

/// Entry point for registering resources and serving reads.
///
/// All registry state lives behind this type. Global and per-session scopes
/// are locked independently, and handlers always run with no lock held.
#[derive(Debug, Clone)]
pub struct ResourceServer {
    global: Arc<RwLock<ResourceRegistry>>,
    sessions: Arc<SessionManager>,
    router: DispatchRouter,
}

impl Default for ResourceServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceServer {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_NOTIFICATION_CAPACITY, None)
    }

    /// Build a server whose sessions get `notification_capacity`-bounded
    /// channels and whose reads are bounded by `request_timeout` unless the
    /// request context says otherwise.
    pub fn with_options(notification_capacity: usize, request_timeout: Option<Duration>) -> Self {
        let global = Arc::new(RwLock::new(ResourceRegistry::new()));
        let sessions = Arc::new(SessionManager::new(notification_capacity));
        let router = DispatchRouter::new(global.clone(), sessions.clone())
            .with_default_timeout(request_timeout);
        Self {
            global,
            sessions,
            router,
        }
    }

    pub fn router(&self) -> &DispatchRouter {
        &self.router
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    // ---- global scope ----

    /// Register a static resource, replacing any resource at the same URI.
    pub async fn add_resource<H>(&self, definition: ResourceDefinition, handler: H)
    where
        H: ResourceHandler + 'static,
    {
        let uri = definition.uri.clone();
        let replaced = self
            .global
            .write()
            .await
            .add_resource(StaticResource::new(definition, shared(handler)));
        tracing::info!(uri = %uri, replaced, "Global resource registered");
    }

    /// Register a resource template, replacing any template with the same
    /// pattern. Fails with `InvalidTemplate` before touching the registry.
    pub async fn add_resource_template<H>(
        &self,
        definition: ResourceTemplateDefinition,
        handler: H,
    ) -> McpResult<()>
    where
        H: ResourceHandler + 'static,
    {
        let template = ResourceTemplate::new(definition, shared(handler))?;
        let pattern = template.pattern().to_string();
        let replaced = self.global.write().await.add_template(template);
        tracing::info!(pattern = %pattern, replaced, "Global template registered");
        Ok(())
    }

    /// Remove the global resource at `uri`. Returns whether it existed.
    pub async fn delete_resource(&self, uri: &str) -> bool {
        self.global.write().await.remove_resource(uri)
    }

    /// Remove the global template `pattern`. Returns whether it existed.
    pub async fn delete_resource_template(&self, pattern: &str) -> bool {
        self.global.write().await.remove_template(pattern)
    }

    // ---- session lifecycle ----

    /// Register a session and hand back the receiving end of its
    /// notification channel.
    pub async fn register_session(&self, session_id: &str) -> McpResult<NotificationReceiver> {
        self.sessions.register(session_id).await
    }

    /// Drop a session's private registry and close its channel.
    pub async fn unregister_session(&self, session_id: &str) -> McpResult<()> {
        self.sessions.unregister(session_id).await
    }

    pub async fn mark_session_initialized(&self, session_id: &str) -> McpResult<()> {
        self.sessions
            .with_session(session_id, |session| {
                session.mark_initialized();
                tracing::info!(session_id = %session_id, "Session initialized");
            })
            .await
    }

    // ---- session scope ----

    /// Register a static resource visible only to `session_id`.
    pub async fn add_session_resource<H>(
        &self,
        session_id: &str,
        definition: ResourceDefinition,
        handler: H,
    ) -> McpResult<()>
    where
        H: ResourceHandler + 'static,
    {
        let resource = StaticResource::new(definition, shared(handler));
        self.sessions
            .with_session(session_id, |session| {
                let uri = resource.uri().to_string();
                let replaced = session.registry_mut().add_resource(resource);
                tracing::info!(session_id = %session_id, uri = %uri, replaced, "Session resource registered");
                announce_list_changed(session);
            })
            .await
    }

    /// Register a template visible only to `session_id`. The pattern is
    /// compiled before the session is looked up.
    pub async fn add_session_resource_template<H>(
        &self,
        session_id: &str,
        definition: ResourceTemplateDefinition,
        handler: H,
    ) -> McpResult<()>
    where
        H: ResourceHandler + 'static,
    {
        let template = ResourceTemplate::new(definition, shared(handler))?;
        self.sessions
            .with_session(session_id, |session| {
                let pattern = template.pattern().to_string();
                let replaced = session.registry_mut().add_template(template);
                tracing::info!(session_id = %session_id, pattern = %pattern, replaced, "Session template registered");
                announce_list_changed(session);
            })
            .await
    }

    pub async fn delete_session_resource(&self, session_id: &str, uri: &str) -> McpResult<bool> {
        self.sessions
            .with_session(session_id, |session| {
                let removed = session.registry_mut().remove_resource(uri);
                if removed {
                    announce_list_changed(session);
                }
                removed
            })
            .await
    }

    pub async fn delete_session_resource_template(
        &self,
        session_id: &str,
        pattern: &str,
    ) -> McpResult<bool> {
        self.sessions
            .with_session(session_id, |session| {
                let removed = session.registry_mut().remove_template(pattern);
                if removed {
                    announce_list_changed(session);
                }
                removed
            })
            .await
    }

    /// Enqueue a notification on a session's channel without blocking.
    pub async fn notify_session(
        &self,
        session_id: &str,
        notification: JsonRpcNotification,
    ) -> McpResult<()> {
        self.sessions
            .with_session(session_id, |session| session.notify(notification))
            .await?
    }

    /// Tell a session that the content behind `uri` changed.
    pub async fn notify_resource_updated(&self, session_id: &str, uri: &str) -> McpResult<()> {
        self.notify_session(session_id, resource_updated(uri)).await
    }

    // ---- dispatch ----

    /// Serve a resources/read in the scopes visible to `ctx`.
    pub async fn read_resource(&self, ctx: &RequestContext, uri: &str) -> McpResult<ReadResourceResult> {
        self.router.read(ctx, uri).await
    }

    /// Static resources visible to `ctx`; session entries shadow global ones
    /// with the same URI.
    pub async fn list_resources(&self, ctx: &RequestContext) -> McpResult<ResourceListResult> {
        let global = self.global.read().await.resource_definitions();
        let resources = match ctx.session_id() {
            Some(id) => {
                let local = self
                    .sessions
                    .with_session(id, |s| s.registry().resource_definitions())
                    .await?;
                overlay_definitions(global, local, |d| d.uri.as_str())
            }
            None => global,
        };
        Ok(ResourceListResult {
            resources,
            next_cursor: None,
        })
    }

    /// Templates visible to `ctx`; session entries shadow global ones with
    /// the same pattern.
    pub async fn list_templates(&self, ctx: &RequestContext) -> McpResult<ResourceTemplateListResult> {
        let global = self.global.read().await.template_definitions();
        let resource_templates = match ctx.session_id() {
            Some(id) => {
                let local = self
                    .sessions
                    .with_session(id, |s| s.registry().template_definitions())
                    .await?;
                overlay_definitions(global, local, |d| d.uri_template.as_str())
            }
            None => global,
        };
        Ok(ResourceTemplateListResult {
            resource_templates,
            next_cursor: None,
        })
    }
}

/// Best effort: overflow is already counted and logged by `notify`.
fn announce_list_changed(session: &mut ClientSession) {
    if session.is_initialized() {
        let _ = session.notify(resources_list_changed());
    }
}
