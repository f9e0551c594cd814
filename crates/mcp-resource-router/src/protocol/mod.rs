//! MCP protocol layer: envelope handling and validation.

pub mod handler;
pub mod in_flight;
pub mod validator;

pub use handler::ProtocolHandler;
