//! MCP resource router entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mcp_resource_router::config::{load_config, read_config, resolve_config_path, ServerConfig};
use mcp_resource_router::protocol::ProtocolHandler;
use mcp_resource_router::transport::StdioTransport;
use mcp_resource_router::types::InitializeResult;

#[derive(Parser)]
#[command(
    name = "mcp-resource-router",
    about = "MCP server routing resources/read through global and per-session URI templates",
    version
)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve {
        /// Configuration file path.
        #[arg(short, long)]
        config: Option<String>,

        /// Log level (trace, debug, info, warn, error).
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Compile every configured template and report failures.
    Validate,

    /// Print server capabilities and configured resources as JSON.
    Info,
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(ServerConfig::default()),
    }
}

/// Logs go to stderr; stdout carries the protocol stream. `RUST_LOG` wins
/// over `level`.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve {
        config: None,
        log_level: None,
    });

    let (config_arg, level_arg) = match &command {
        Commands::Serve { config, log_level } => (
            config.clone().or(cli.config.clone()),
            log_level.clone().or(cli.log_level.clone()),
        ),
        _ => (cli.config.clone(), cli.log_level.clone()),
    };
    let path = resolve_config_path(config_arg.as_deref());

    match command {
        Commands::Serve { .. } => {
            let config = load(path.as_ref())?;
            init_logging(level_arg.as_deref().unwrap_or(&config.log_level));

            let server = config.build_server().await?;
            let handler = ProtocolHandler::new(server);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Validate => {
            init_logging(level_arg.as_deref().unwrap_or("warn"));
            validate(path.as_ref())?;
        }

        Commands::Info => {
            let config = load(path.as_ref())?;
            init_logging(level_arg.as_deref().unwrap_or(&config.log_level));

            let capabilities = InitializeResult::default_result();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "resources": config.resources.iter().map(|r| &r.uri).collect::<Vec<_>>(),
                "templates": config.templates.iter().map(|t| &t.uri_template).collect::<Vec<_>>(),
                "notification_capacity": config.notification_capacity,
                "request_timeout_ms": config.request_timeout_ms,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

fn validate(path: Option<&PathBuf>) -> anyhow::Result<()> {
    let Some(path) = path else {
        println!("No configuration file given; defaults are valid.");
        return Ok(());
    };

    if !path.exists() {
        println!("Config file {} not found; using defaults.", path.display());
    }

    let config = match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config file {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    let errors = config.validate();
    if errors.is_empty() {
        println!("Valid config file: {}", path.display());
        println!("  Resources: {}", config.resources.len());
        println!("  Templates: {}", config.templates.len());
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  {e}");
        }
        eprintln!("Invalid config file {}: {} template error(s)", path.display(), errors.len());
        std::process::exit(1);
    }
}
