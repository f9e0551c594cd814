//! Error types and JSON-RPC error code mapping.

use super::message::{JsonRpcError, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// The request was cancelled before completion.
    pub const REQUEST_CANCELLED: i32 = -32800;
}

/// Server-defined error codes (JSON-RPC reserved range -32000..-32099).
pub mod mcp_error_codes {
    /// A resource handler returned an application-level error.
    pub const HANDLER_ERROR: i32 = -32000;
    /// The session named by the request context is not registered.
    pub const SESSION_NOT_FOUND: i32 = -32001;
    /// No visible resource or template matched the URI.
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
    /// A URI template failed to compile.
    pub const INVALID_TEMPLATE: i32 = -32003;
    /// A session with the same id is already registered.
    pub const SESSION_ALREADY_EXISTS: i32 = -32004;
    /// A session's notification channel is full.
    pub const NOTIFICATION_OVERFLOW: i32 = -32005;
    /// The request exceeded its deadline.
    pub const REQUEST_TIMEOUT: i32 = -32006;
}

/// All errors surfaced by the resource router.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Invalid URI template '{pattern}': {reason}")]
    InvalidTemplate { pattern: String, reason: String },

    #[error("Session already exists: {0}")]
    SessionAlreadyExists(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource handler failed: {0}")]
    HandlerError(String),

    #[error("Internal fault: {0}")]
    InternalFault(String),

    #[error("Notification channel full for session {0}")]
    NotificationOverflow(String),

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Request timed out after {0} ms")]
    RequestTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;

        match self {
            McpError::ParseError(_) | McpError::Json(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InvalidTemplate { .. } => INVALID_TEMPLATE,
            McpError::SessionAlreadyExists(_) => SESSION_ALREADY_EXISTS,
            McpError::SessionNotFound(_) => SESSION_NOT_FOUND,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::HandlerError(_) => HANDLER_ERROR,
            McpError::NotificationOverflow(_) => NOTIFICATION_OVERFLOW,
            McpError::RequestCancelled => REQUEST_CANCELLED,
            McpError::RequestTimeout(_) => REQUEST_TIMEOUT,
            McpError::InternalFault(_)
            | McpError::Config(_)
            | McpError::Transport(_)
            | McpError::Io(_) => INTERNAL_ERROR,
        }
    }

    /// Build a JSON-RPC error response carrying this error.
    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError::new(id, self.code(), self.to_string())
    }
}

/// Convenience alias used across the crate.
pub type McpResult<T> = Result<T, McpError>;
