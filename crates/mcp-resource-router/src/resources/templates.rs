//! Registered resource entries: static resources and URI templates.

use std::fmt;

use crate::types::{McpResult, ResourceDefinition, ResourceTemplateDefinition};
use crate::uri_template::UriTemplate;

use super::handler::SharedHandler;

/// An exact-URI resource and its handler.
#[derive(Clone)]
pub struct StaticResource {
    definition: ResourceDefinition,
    handler: SharedHandler,
}

impl StaticResource {
    pub fn new(definition: ResourceDefinition, handler: SharedHandler) -> Self {
        Self {
            definition,
            handler,
        }
    }

    pub fn uri(&self) -> &str {
        &self.definition.uri
    }

    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }
}

impl fmt::Debug for StaticResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticResource")
            .field("uri", &self.definition.uri)
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

/// A compiled URI template paired with its handler. Immutable once built;
/// replacing a pattern means registering a new `ResourceTemplate`.
#[derive(Clone)]
pub struct ResourceTemplate {
    template: UriTemplate,
    definition: ResourceTemplateDefinition,
    handler: SharedHandler,
}

impl ResourceTemplate {
    /// Compile `definition.uri_template`. Fails with `InvalidTemplate`.
    pub fn new(definition: ResourceTemplateDefinition, handler: SharedHandler) -> McpResult<Self> {
        let template = UriTemplate::compile(&definition.uri_template)?;
        Ok(Self {
            template,
            definition,
            handler,
        })
    }

    /// The registry key.
    pub fn pattern(&self) -> &str {
        self.template.pattern()
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    pub fn definition(&self) -> &ResourceTemplateDefinition {
        &self.definition
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }
}

impl fmt::Debug for ResourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTemplate")
            .field("pattern", &self.template.pattern())
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}
