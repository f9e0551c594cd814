//! Stress tests: large registries, many requests, config-driven setup.
//!
//! Tests verify that resolution stays correct with hundreds of templates and
//! that thousands of concurrent reads complete within generous bounds.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use mcp_resource_router::config::load_config;
use mcp_resource_router::{ProtocolHandler, RequestContext};
use serde_json::json;
use tempfile::tempdir;

// ─── Helpers ───────────────────────────────────────────────────────────────

fn config_with_templates(count: usize) -> String {
    let mut toml = String::from("notification_capacity = 16\nrequest_timeout_ms = 5000\n");
    for i in 0..count {
        write!(
            toml,
            "\n[[templates]]\nuri_template = \"kind{i}://{{id}}/items{{/path*}}\"\nname = \"kind{i}\"\ntext = \"kind{i} {{id}} {{path}}\"\n"
        )
        .unwrap();
    }
    toml
}

async fn read_text(handler: &ProtocolHandler, id: i64, uri: &str) -> String {
    let raw = serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "resources/read",
        "params": {"uri": uri},
    }))
    .unwrap();
    let reply = handler
        .handle_raw(&RequestContext::new(), &raw)
        .await
        .unwrap();
    reply["result"]["contents"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("error reply: {reply}"))
        .to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_500_templates_from_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.toml");
    std::fs::write(&path, config_with_templates(500)).unwrap();

    let start = Instant::now();
    let config = load_config(&path).unwrap();
    assert_eq!(config.templates.len(), 500);
    let server = config.build_server().await.unwrap();
    let handler = ProtocolHandler::new(server);

    assert_eq!(read_text(&handler, 1, "kind0://a/items/x").await, "kind0 a x");
    assert_eq!(read_text(&handler, 2, "kind499://b/items/p/q").await, "kind499 b p/q");
    assert_eq!(read_text(&handler, 3, "kind250://c/items").await, "kind250 c ");
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_10k_concurrent_reads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.toml");
    std::fs::write(&path, config_with_templates(20)).unwrap();
    let server = load_config(&path).unwrap().build_server().await.unwrap();
    let handler = ProtocolHandler::new(server);

    let start = Instant::now();
    let mut tasks = Vec::new();
    for worker in 0..100i64 {
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..100i64 {
                let kind = (worker + i) % 20;
                let text = read_text(&handler, worker * 1000 + i, &format!("kind{kind}://{i}/items/{worker}")).await;
                assert_eq!(text, format!("kind{kind} {i} {worker}"));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert!(start.elapsed() < Duration::from_secs(60));
}
