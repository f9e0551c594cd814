//! Resource entries, handler abstraction, argument coercion and the
//! per-scope registry.

pub mod arguments;
pub mod handler;
pub mod registry;
pub mod templates;

pub use arguments::to_arguments;
pub use handler::{shared, HandlerResult, ResourceHandler, SharedHandler};
pub use registry::{overlay_definitions, MatchedEntry, Resolution, ResourceRegistry};
pub use templates::{ResourceTemplate, StaticResource};
