//! The uniform resource handler abstraction.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::dispatch::RequestContext;
use crate::types::{ReadResourceRequest, ResourceContent};

/// What a handler produces: content items, or an application-level error.
pub type HandlerResult = anyhow::Result<Vec<ResourceContent>>;

/// A resource handler, shared between the registry and in-flight requests.
pub type SharedHandler = Arc<dyn ResourceHandler>;

/// Produces content for a resolved resource read. `request.arguments` is
/// populated from the matched template before `read` is called.
pub trait ResourceHandler: Send + Sync {
    fn read(&self, ctx: RequestContext, request: ReadResourceRequest)
        -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> ResourceHandler for F
where
    F: Fn(RequestContext, ReadResourceRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn read(
        &self,
        ctx: RequestContext,
        request: ReadResourceRequest,
    ) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx, request))
    }
}

/// Wrap a handler for storage.
pub fn shared<H: ResourceHandler + 'static>(handler: H) -> SharedHandler {
    Arc::new(handler)
}
