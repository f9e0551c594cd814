//! Envelope and parameter validation.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{JsonRpcRequest, McpError, McpResult, ResourceReadParams, JSONRPC_VERSION};

/// Check the fixed parts of a request envelope.
pub fn validate_request(request: &JsonRpcRequest) -> McpResult<()> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "unsupported jsonrpc version '{}'",
            request.jsonrpc
        )));
    }
    if request.method.is_empty() {
        return Err(McpError::InvalidRequest("empty method name".to_string()));
    }
    Ok(())
}

/// Decode resources/read params. A missing, non-string or empty `uri` is an
/// invalid-params error.
pub fn read_params(params: Option<&Value>) -> McpResult<ResourceReadParams> {
    let params = params.ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    match params.get("uri") {
        Some(Value::String(uri)) if !uri.is_empty() => Ok(ResourceReadParams { uri: uri.clone() }),
        Some(Value::String(_)) => Err(McpError::InvalidParams("uri must not be empty".to_string())),
        Some(_) => Err(McpError::InvalidParams("uri must be a string".to_string())),
        None => Err(McpError::InvalidParams("missing required parameter 'uri'".to_string())),
    }
}

/// Decode optional params, treating absence as the type's default.
pub fn optional_params<T: DeserializeOwned + Default>(params: Option<&Value>) -> McpResult<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| McpError::InvalidParams(e.to_string())),
    }
}
