//! Concurrent access: many sessions registering, mutating and dispatching at
//! once.
//!
//! Tests verify that session scopes stay isolated under contention and that
//! racing unregistration never produces anything but a clean error.

use std::sync::Arc;
use tokio::sync::Barrier;

use mcp_resource_router::types::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, McpError, ReadResourceRequest, RequestId,
    ResourceContent, ResourceTemplateDefinition,
};
use mcp_resource_router::{ProtocolHandler, RequestContext, ResourceServer};
use serde_json::json;

// ─── Helpers ───────────────────────────────────────────────────────────────

async fn add_labelled_template(server: &ResourceServer, session: Option<&str>, label: String) {
    let definition = ResourceTemplateDefinition::new("user://{id}", "user");
    let handler = move |_ctx: RequestContext, req: ReadResourceRequest| {
        let label = label.clone();
        async move {
            let id = req.argument("id").and_then(|a| a.as_str()).unwrap_or_default().to_string();
            Ok::<_, anyhow::Error>(vec![ResourceContent::text(req.uri, format!("{label}:{id}"))])
        }
    };
    match session {
        Some(id) => server
            .add_session_resource_template(id, definition, handler)
            .await
            .expect("session template"),
        None => server
            .add_resource_template(definition, handler)
            .await
            .expect("global template"),
    }
}

async fn init_session(handler: &ProtocolHandler, ctx: &RequestContext) {
    let init_req = JsonRpcRequest::new(
        RequestId::Number(0),
        "initialize",
        Some(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "1.0"}
        })),
    );
    handler
        .handle_message(ctx, JsonRpcMessage::Request(init_req))
        .await;

    let init_notif = JsonRpcNotification::new("notifications/initialized", None);
    handler
        .handle_message(ctx, JsonRpcMessage::Notification(init_notif))
        .await;
}

async fn read(handler: &ProtocolHandler, ctx: &RequestContext, id: i64, uri: &str) -> serde_json::Value {
    let request = JsonRpcRequest::new(
        RequestId::Number(id),
        "resources/read",
        Some(json!({"uri": uri})),
    );
    handler
        .handle_message(ctx, JsonRpcMessage::Request(request))
        .await
        .expect("read must produce a reply")
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_isolated() {
    const SESSIONS: usize = 32;
    const READS: usize = 25;

    let server = ResourceServer::new();
    add_labelled_template(&server, None, "global".to_string()).await;
    let handler = ProtocolHandler::new(server.clone());
    let barrier = Arc::new(Barrier::new(SESSIONS));

    let mut tasks = Vec::new();
    for n in 0..SESSIONS {
        let server = server.clone();
        let handler = handler.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            let session_id = format!("session-{n}");
            let mut rx = server.register_session(&session_id).await.unwrap();
            let ctx = RequestContext::for_session(&session_id);
            init_session(&handler, &ctx).await;

            // Even sessions shadow the global template, odd ones fall back.
            if n % 2 == 0 {
                add_labelled_template(&server, Some(&session_id), session_id.clone()).await;
                let notification = rx.recv().await.unwrap();
                assert_eq!(notification.method, "notifications/resources/list_changed");
            }
            barrier.wait().await;

            for i in 0..READS {
                let reply = read(&handler, &ctx, i as i64, &format!("user://{i}")).await;
                let text = reply["result"]["contents"][0]["text"].as_str().unwrap().to_string();
                let expected = if n % 2 == 0 {
                    format!("{session_id}:{i}")
                } else {
                    format!("global:{i}")
                };
                assert_eq!(text, expected);
            }

            server.unregister_session(&session_id).await.unwrap();
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert!(server.sessions().is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unregister_races_with_reads() {
    const ROUNDS: usize = 50;

    let server = ResourceServer::new();
    add_labelled_template(&server, None, "global".to_string()).await;

    for round in 0..ROUNDS {
        let session_id = format!("racer-{round}");
        let _rx = server.register_session(&session_id).await.unwrap();
        add_labelled_template(&server, Some(&session_id), "local".to_string()).await;

        let reader = {
            let server = server.clone();
            let ctx = RequestContext::for_session(&session_id);
            tokio::spawn(async move {
                let mut outcomes = Vec::new();
                for i in 0..20 {
                    outcomes.push(server.read_resource(&ctx, &format!("user://{i}")).await);
                }
                outcomes
            })
        };
        server.unregister_session(&session_id).await.unwrap();

        for outcome in reader.await.unwrap() {
            match outcome {
                Ok(result) => {
                    let text = result.contents[0].text.as_deref().unwrap();
                    assert!(text.starts_with("local:"), "unexpected fallback: {text}");
                }
                Err(McpError::SessionNotFound(id)) => assert_eq!(id, session_id),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
    }
}

#[tokio::test]
async fn test_rapid_handoff() {
    let server = ResourceServer::new();
    let handler = ProtocolHandler::new(server.clone());

    for generation in 0..100 {
        let _rx = server.register_session("handoff").await.unwrap();
        add_labelled_template(&server, Some("handoff"), format!("gen{generation}")).await;

        let ctx = RequestContext::for_session("handoff");
        let reply = read(&handler, &ctx, generation, "user://x").await;
        assert_eq!(
            reply["result"]["contents"][0]["text"],
            format!("gen{generation}:x")
        );

        server.unregister_session("handoff").await.unwrap();
        let reply = read(&handler, &ctx, generation, "user://x").await;
        assert_eq!(reply["error"]["code"], -32001);
    }
}
