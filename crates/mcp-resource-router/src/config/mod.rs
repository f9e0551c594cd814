//! Configuration loading and resolution.

pub mod loader;

pub use loader::{
    load_config, parse_config, read_config, render_text, resolve_config_path, ServerConfig,
    StaticResourceConfig, TemplateConfig, CONFIG_ENV_VAR,
};
