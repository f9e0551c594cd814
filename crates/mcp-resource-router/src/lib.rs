//! MCP resource router: URI-template matching and session-scoped dispatch for
//! `resources/read`.
//!
//! Resources and templates are registered either globally or for a single
//! client session. A read is resolved against the caller's session first and
//! the global registry second, and the winning handler receives the variables
//! extracted from the URI.

pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;
pub mod uri_template;

pub use config::ServerConfig;
pub use dispatch::{DispatchRouter, RequestContext, Scope};
pub use protocol::ProtocolHandler;
pub use resources::{ResourceHandler, ResourceRegistry};
pub use server::ResourceServer;
pub use session::SessionManager;
pub use transport::StdioTransport;
pub use uri_template::UriTemplate;
