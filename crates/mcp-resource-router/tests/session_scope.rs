//! Session lifecycle, scope fallback, notifications and listing.

mod common;

use mcp_resource_router::resources::overlay_definitions;
use mcp_resource_router::types::{
    resource_updated, resources_list_changed, McpError, ResourceDefinition,
    ResourceTemplateDefinition,
};
use mcp_resource_router::{RequestContext, ResourceServer};

use common::fixtures::Recorder;

async fn text_of(server: &ResourceServer, ctx: &RequestContext, uri: &str) -> String {
    let result = server.read_resource(ctx, uri).await.unwrap();
    result.contents[0].text.clone().unwrap_or_default()
}

#[tokio::test]
async fn test_session_falls_back_to_global() {
    let server = ResourceServer::new();
    let global = Recorder::new();
    server
        .add_resource_template(
            ResourceTemplateDefinition::new("docs://{name}", "docs"),
            global.handler("global"),
        )
        .await
        .unwrap();
    let _rx = server.register_session("s1").await.unwrap();
    server
        .add_session_resource_template(
            "s1",
            ResourceTemplateDefinition::new("notes://{name}", "notes"),
            Recorder::new().handler("session"),
        )
        .await
        .unwrap();

    let ctx = RequestContext::for_session("s1");
    assert_eq!(text_of(&server, &ctx, "docs://intro").await, "global");
    assert_eq!(text_of(&server, &ctx, "notes://todo").await, "session");
    assert_eq!(global.count(), 1);
}

#[tokio::test]
async fn test_session_entries_are_private() {
    let server = ResourceServer::new();
    let _a = server.register_session("a").await.unwrap();
    let _b = server.register_session("b").await.unwrap();
    server
        .add_session_resource("a", ResourceDefinition::new("mine://x", "x"), Recorder::new().handler("a"))
        .await
        .unwrap();

    let err = server
        .read_resource(&RequestContext::for_session("b"), "mine://x")
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ResourceNotFound(ref uri) if uri == "mine://x"));

    let err = server
        .read_resource(&RequestContext::new(), "mine://x")
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ResourceNotFound(_)));
}

#[tokio::test]
async fn test_unregister_discards_session_state() {
    let server = ResourceServer::new();
    let mut rx = server.register_session("s1").await.unwrap();
    server
        .add_session_resource("s1", ResourceDefinition::new("a://b", "b"), Recorder::new().handler("x"))
        .await
        .unwrap();

    server.unregister_session("s1").await.unwrap();
    assert!(rx.recv().await.is_none());

    let ctx = RequestContext::for_session("s1");
    assert!(matches!(
        server.read_resource(&ctx, "a://b").await,
        Err(McpError::SessionNotFound(_))
    ));
    assert!(matches!(
        server
            .add_session_resource("s1", ResourceDefinition::new("a://c", "c"), Recorder::new().handler("y"))
            .await,
        Err(McpError::SessionNotFound(_))
    ));
    assert!(matches!(
        server.delete_session_resource_template("s1", "a://{x}").await,
        Err(McpError::SessionNotFound(_))
    ));
    assert!(matches!(
        server.unregister_session("s1").await,
        Err(McpError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let server = ResourceServer::new();
    let _rx = server.register_session("dup").await.unwrap();
    assert!(matches!(
        server.register_session("dup").await,
        Err(McpError::SessionAlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_add_to_unknown_session() {
    let server = ResourceServer::new();
    let err = server
        .add_session_resource_template(
            "nobody",
            ResourceTemplateDefinition::new("x://{y}", "x"),
            Recorder::new().handler("x"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::SessionNotFound(ref id) if id == "nobody"));
}

#[tokio::test]
async fn test_overwrite_and_delete_template() {
    let server = ResourceServer::new();
    let first = Recorder::new();
    let second = Recorder::new();
    let def = || ResourceTemplateDefinition::new("items://{id}", "items");

    server.add_resource_template(def(), first.handler("first")).await.unwrap();
    server.add_resource_template(def(), second.handler("second")).await.unwrap();

    let ctx = RequestContext::new();
    assert_eq!(text_of(&server, &ctx, "items://1").await, "second");
    assert_eq!(first.count(), 0);

    let listed = server.list_templates(&ctx).await.unwrap();
    assert_eq!(listed.resource_templates.len(), 1);

    assert!(server.delete_resource_template("items://{id}").await);
    assert!(!server.delete_resource_template("items://{id}").await);
    assert!(matches!(
        server.read_resource(&ctx, "items://1").await,
        Err(McpError::ResourceNotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_global_resource() {
    let server = ResourceServer::new();
    server
        .add_resource(ResourceDefinition::new("cfg://main", "main"), Recorder::new().handler("v1"))
        .await;
    assert!(server.delete_resource("cfg://main").await);
    assert!(matches!(
        server.read_resource(&RequestContext::new(), "cfg://main").await,
        Err(McpError::ResourceNotFound(_))
    ));
}

#[tokio::test]
async fn test_notifications_overflow_is_counted() {
    let server = ResourceServer::with_options(2, None);
    let mut rx = server.register_session("s1").await.unwrap();

    server.notify_resource_updated("s1", "a://1").await.unwrap();
    server.notify_resource_updated("s1", "a://2").await.unwrap();
    let err = server.notify_resource_updated("s1", "a://3").await.unwrap_err();
    assert!(matches!(err, McpError::NotificationOverflow(_)));
    assert_eq!(server.sessions().overflow_count(), 1);

    assert_eq!(rx.recv().await.unwrap(), resource_updated("a://1"));
    assert_eq!(rx.recv().await.unwrap(), resource_updated("a://2"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_template_changes_announced_when_initialized() {
    let server = ResourceServer::new();
    let mut rx = server.register_session("s1").await.unwrap();
    server.mark_session_initialized("s1").await.unwrap();

    server
        .add_session_resource_template(
            "s1",
            ResourceTemplateDefinition::new("t://{x}", "t"),
            Recorder::new().handler("t"),
        )
        .await
        .unwrap();
    assert_eq!(rx.recv().await.unwrap(), resources_list_changed());

    assert!(server.delete_session_resource_template("s1", "t://{x}").await.unwrap());
    assert_eq!(rx.recv().await.unwrap(), resources_list_changed());
}

#[tokio::test]
async fn test_template_listing_overlay() {
    let server = ResourceServer::new();
    server
        .add_resource_template(
            ResourceTemplateDefinition::new("users://{id}", "global users"),
            Recorder::new().handler("g"),
        )
        .await
        .unwrap();
    server
        .add_resource_template(
            ResourceTemplateDefinition::new("teams://{id}", "teams"),
            Recorder::new().handler("g"),
        )
        .await
        .unwrap();
    let _rx = server.register_session("s1").await.unwrap();
    server
        .add_session_resource_template(
            "s1",
            ResourceTemplateDefinition::new("users://{id}", "session users"),
            Recorder::new().handler("s"),
        )
        .await
        .unwrap();

    let listed = server
        .list_templates(&RequestContext::for_session("s1"))
        .await
        .unwrap();
    let names: Vec<&str> = listed.resource_templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["session users", "teams"]);

    assert!(matches!(
        server.list_templates(&RequestContext::for_session("ghost")).await,
        Err(McpError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_resource_listing_matches_overlay_merge() {
    let server = ResourceServer::new();
    for (uri, name) in [("docs://a", "global a"), ("docs://b", "global b")] {
        server
            .add_resource(ResourceDefinition::new(uri, name), Recorder::new().handler("g"))
            .await;
    }
    let _rx = server.register_session("s1").await.unwrap();
    for (uri, name) in [("docs://b", "session b"), ("docs://c", "session c")] {
        server
            .add_session_resource("s1", ResourceDefinition::new(uri, name), Recorder::new().handler("s"))
            .await
            .unwrap();
    }

    let global = server.list_resources(&RequestContext::new()).await.unwrap().resources;
    let listed = server
        .list_resources(&RequestContext::for_session("s1"))
        .await
        .unwrap()
        .resources;
    let local: Vec<ResourceDefinition> = listed
        .iter()
        .filter(|d| d.name.starts_with("session"))
        .cloned()
        .collect();

    let merged = overlay_definitions(global, local, |d| d.uri.as_str());
    let names: Vec<&str> = merged.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["global a", "session b", "session c"]);
    assert_eq!(
        listed.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
        names
    );
}
