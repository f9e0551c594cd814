//! Test data fixtures for resource router tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use mcp_resource_router::resources::ResourceHandler;
use mcp_resource_router::types::{ReadResourceRequest, ResourceContent};
use mcp_resource_router::{ProtocolHandler, RequestContext};

/// Records every request a handler receives.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<ReadResourceRequest>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records the request and answers with `text`.
    pub fn handler(&self, text: &'static str) -> impl ResourceHandler {
        let calls = self.calls.clone();
        move |_ctx: RequestContext, request: ReadResourceRequest| {
            calls.lock().unwrap().push(request.clone());
            async move { Ok::<_, anyhow::Error>(vec![ResourceContent::text(request.uri, text)]) }
        }
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last(&self) -> ReadResourceRequest {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("handler was never called")
    }
}

/// Serialized resources/read envelope.
pub fn read_envelope(id: i64, uri: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "resources/read",
        "params": {"uri": uri},
    }))
    .unwrap()
}

/// Send a resources/read through the envelope layer and return the reply.
pub async fn read_via_envelope(handler: &ProtocolHandler, ctx: &RequestContext, uri: &str) -> Value {
    handler
        .handle_raw(ctx, &read_envelope(1, uri))
        .await
        .expect("requests always get a reply")
}

/// Assert a successful single-content reply and return its text.
pub fn single_text(reply: &Value) -> String {
    assert!(reply.get("error").is_none(), "unexpected error reply: {reply}");
    let contents = reply["result"]["contents"].as_array().expect("contents array");
    assert_eq!(contents.len(), 1, "expected one content item: {reply}");
    contents[0]["text"].as_str().unwrap_or_default().to_string()
}

/// The error code of an error reply.
pub fn error_code(reply: &Value) -> i64 {
    reply["error"]["code"]
        .as_i64()
        .unwrap_or_else(|| panic!("expected error reply, got {reply}"))
}
