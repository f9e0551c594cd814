//! Configuration file loading and resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::RequestContext;
use crate::resources::ResourceHandler;
use crate::server::ResourceServer;
use crate::session::DEFAULT_NOTIFICATION_CAPACITY;
use crate::types::{
    Argument, Arguments, McpError, McpResult, ReadResourceRequest, ResourceContent,
    ResourceDefinition, ResourceTemplateDefinition,
};
use crate::uri_template::UriTemplate;

/// Environment variable consulted when no config path is given.
pub const CONFIG_ENV_VAR: &str = "MCP_RESOURCE_ROUTER_CONFIG";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Bound of each session's notification channel.
    pub notification_capacity: usize,
    /// Deadline for a single resources/read, in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Static text resources registered in the global scope.
    pub resources: Vec<StaticResourceConfig>,
    /// Text templates registered in the global scope.
    pub templates: Vec<TemplateConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            request_timeout_ms: None,
            resources: Vec::new(),
            templates: Vec::new(),
        }
    }
}

/// A `[[resources]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticResourceConfig {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub text: String,
}

/// A `[[templates]]` entry. `{var}` placeholders in `text` are replaced with
/// the matched argument values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub uri_template: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub text: String,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Compile every configured template, collecting all failures.
    pub fn validate(&self) -> Vec<McpError> {
        self.templates
            .iter()
            .filter_map(|t| UriTemplate::compile(&t.uri_template).err())
            .map(|e| McpError::Config(e.to_string()))
            .collect()
    }

    /// Build a server with every configured entry registered globally.
    pub async fn build_server(&self) -> McpResult<ResourceServer> {
        let server = ResourceServer::with_options(self.notification_capacity, self.request_timeout());

        for entry in &self.resources {
            let mut definition = ResourceDefinition::new(&entry.uri, &entry.name);
            definition.description = entry.description.clone();
            definition.mime_type = entry.mime_type.clone();
            server
                .add_resource(definition, text_handler(entry.text.clone(), entry.mime_type.clone()))
                .await;
        }

        for entry in &self.templates {
            let mut definition = ResourceTemplateDefinition::new(&entry.uri_template, &entry.name);
            definition.description = entry.description.clone();
            definition.mime_type = entry.mime_type.clone();
            server
                .add_resource_template(definition, text_handler(entry.text.clone(), entry.mime_type.clone()))
                .await
                .map_err(|e| McpError::Config(e.to_string()))?;
        }

        tracing::info!(
            resources = self.resources.len(),
            templates = self.templates.len(),
            "Configured resources registered"
        );
        Ok(server)
    }
}

/// Parse configuration text without validating templates.
pub fn parse_config(content: &str) -> McpResult<ServerConfig> {
    toml::from_str(content).map_err(|e| McpError::Config(e.to_string()))
}

/// Read a TOML config file without validating templates. A missing file
/// yields the defaults.
pub fn read_config(path: &Path) -> McpResult<ServerConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(ServerConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration from a TOML file. A missing file yields the defaults;
/// a template that does not compile is a `Config` error.
pub fn load_config(path: &Path) -> McpResult<ServerConfig> {
    let config = read_config(path)?;
    if let Some(err) = config.validate().into_iter().next() {
        return Err(err);
    }
    Ok(config)
}

/// Pick the config path: explicit argument, then `MCP_RESOURCE_ROUTER_CONFIG`.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn text_handler(text: String, mime_type: Option<String>) -> impl ResourceHandler {
    move |_ctx: RequestContext, request: ReadResourceRequest| {
        let body = render_text(&text, &request.arguments);
        let mime_type = mime_type.clone();
        async move {
            let mut content = ResourceContent::text(request.uri, body);
            if let Some(mime_type) = mime_type {
                content = content.with_mime_type(mime_type);
            }
            Ok::<_, anyhow::Error>(vec![content])
        }
    }
}

/// Substitute `{name}` placeholders. Lists join with `/`, maps render as
/// `key=value` pairs joined with `&`. Unknown placeholders stay verbatim.
pub fn render_text(text: &str, arguments: &Arguments) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match arguments.get(name) {
                    Some(arg) => out.push_str(&render_argument(arg)),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_argument(arg: &Argument) -> String {
    match arg {
        Argument::Text(s) => s.clone(),
        Argument::List(items) => items.join("/"),
        Argument::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&"),
    }
}
