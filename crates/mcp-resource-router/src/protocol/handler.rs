//! JSON-RPC envelope handling for the resource methods.

use serde::Serialize;
use serde_json::{json, Value};

use crate::dispatch::RequestContext;
use crate::server::ResourceServer;
use crate::types::{
    InitializeResult, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListParams, McpError, McpResult, RequestId,
};

use super::in_flight::InFlight;
use super::validator::{optional_params, read_params, validate_request};

/// Decodes envelopes, routes them to the [`ResourceServer`] and encodes the
/// replies. Requests always produce exactly one response value;
/// notifications and stray responses produce none.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    server: ResourceServer,
    in_flight: InFlight,
}

impl ProtocolHandler {
    pub fn new(server: ResourceServer) -> Self {
        Self {
            server,
            in_flight: InFlight::new(),
        }
    }

    pub fn server(&self) -> &ResourceServer {
        &self.server
    }

    /// Handle one raw envelope. Undecodable input yields a parse error whose
    /// id is recovered from the payload when possible.
    pub async fn handle_raw(&self, ctx: &RequestContext, raw: &[u8]) -> Option<Value> {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected malformed JSON");
                return Some(error_value(McpError::ParseError(e.to_string()), RequestId::Null));
            }
        };

        match serde_json::from_value::<JsonRpcMessage>(value.clone()) {
            Ok(message) => self.handle_message(ctx, message).await,
            Err(_) => {
                let id = RequestId::recover(&value);
                tracing::debug!(id = %id, "Rejected envelope without a usable method");
                Some(error_value(
                    McpError::ParseError("not a valid JSON-RPC envelope".to_string()),
                    id,
                ))
            }
        }
    }

    /// Handle one decoded envelope.
    pub async fn handle_message(&self, ctx: &RequestContext, message: JsonRpcMessage) -> Option<Value> {
        match message {
            JsonRpcMessage::Request(request) => Some(self.handle_request(ctx, request).await),
            JsonRpcMessage::Notification(notification) => {
                self.handle_notification(ctx, notification).await;
                None
            }
            JsonRpcMessage::Response(_) | JsonRpcMessage::Error(_) => {
                tracing::debug!("Ignoring client-sent response envelope");
                None
            }
        }
    }

    /// Cancel the in-flight request `id` sent under `ctx`'s session.
    /// Returns whether it was found.
    pub fn cancel(&self, ctx: &RequestContext, id: &RequestId) -> bool {
        self.in_flight.cancel(ctx.session_id(), id)
    }

    /// Number of requests currently being served.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    async fn handle_request(&self, ctx: &RequestContext, request: JsonRpcRequest) -> Value {
        let id = request.id.clone();
        if let Err(e) = validate_request(&request) {
            return error_value(e, id);
        }

        let token = ctx.cancellation_token().child_token();
        let guard = self
            .in_flight
            .track(ctx.session_id(), id.clone(), token.clone());
        let scoped = ctx.clone().with_cancellation(token);

        let result = self.dispatch(&scoped, &request).await;
        drop(guard);

        match result {
            Ok(result) => to_value(JsonRpcResponse::new(id, result)),
            Err(e) => {
                tracing::debug!(
                    id = %id,
                    method = %request.method,
                    code = e.code(),
                    error = %e,
                    "Request failed"
                );
                error_value(e, id)
            }
        }
    }

    async fn dispatch(&self, ctx: &RequestContext, request: &JsonRpcRequest) -> McpResult<Value> {
        let params = request.params.as_ref();
        match request.method.as_str() {
            "initialize" => Ok(to_value(InitializeResult::default_result())),
            "ping" => Ok(json!({})),
            "resources/read" => {
                let params = read_params(params)?;
                let result = self.server.read_resource(ctx, &params.uri).await?;
                Ok(to_value(result))
            }
            "resources/list" => {
                let _page: ListParams = optional_params(params)?;
                Ok(to_value(self.server.list_resources(ctx).await?))
            }
            "resources/templates/list" => {
                let _page: ListParams = optional_params(params)?;
                Ok(to_value(self.server.list_templates(ctx).await?))
            }
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    async fn handle_notification(&self, ctx: &RequestContext, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => match ctx.session_id() {
                Some(id) => {
                    if let Err(e) = self.server.mark_session_initialized(id).await {
                        tracing::warn!(session_id = %id, error = %e, "Initialized notification for unknown session");
                    }
                }
                None => tracing::debug!("Initialized notification without a session"),
            },
            "notifications/cancelled" => {
                let target = notification
                    .params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                    .map(RequestId::from_value);
                match target {
                    Some(id) => {
                        let found = self.cancel(ctx, &id);
                        tracing::debug!(
                            session_id = ?ctx.session_id(),
                            id = %id,
                            found,
                            "Cancellation requested"
                        );
                    }
                    None => tracing::debug!("Cancellation without requestId"),
                }
            }
            other => tracing::debug!(method = %other, "Ignoring notification"),
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

fn error_value(error: McpError, id: RequestId) -> Value {
    to_value(error.to_json_rpc_error(id))
}
