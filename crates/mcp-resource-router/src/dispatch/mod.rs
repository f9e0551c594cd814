//! Request dispatch: call context and the scope-resolving router.

pub mod context;
pub mod router;

pub use context::RequestContext;
pub use router::{DispatchRouter, Resolved, Scope};
