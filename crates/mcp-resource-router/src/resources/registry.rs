//! Resource registration and lookup for one scope.
//!
//! The same structure backs the global registry and every session's private
//! registry; locking is the owner's concern.

use crate::types::{Arguments, ResourceDefinition, ResourceTemplateDefinition};

use super::arguments::to_arguments;
use super::handler::SharedHandler;
use super::templates::{ResourceTemplate, StaticResource};

/// Which registered entry produced a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedEntry {
    /// Exact match on a static resource URI.
    Static(String),
    /// Structural match on a template pattern.
    Template(String),
}

/// A successful lookup: the handler to run and its arguments.
#[derive(Clone)]
pub struct Resolution {
    pub handler: SharedHandler,
    pub arguments: Arguments,
    pub matched: MatchedEntry,
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("arguments", &self.arguments)
            .field("matched", &self.matched)
            .finish_non_exhaustive()
    }
}

/// Static resources and templates of a single scope, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    resources: Vec<StaticResource>,
    templates: Vec<ResourceTemplate>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a static resource, replacing any entry with the same URI in
    /// place. Returns `true` if an entry was replaced.
    pub fn add_resource(&mut self, resource: StaticResource) -> bool {
        match self.resources.iter_mut().find(|r| r.uri() == resource.uri()) {
            Some(existing) => {
                *existing = resource;
                true
            }
            None => {
                self.resources.push(resource);
                false
            }
        }
    }

    /// Insert a template, replacing any entry with the same pattern in place
    /// (the replaced entry keeps its position in registration order).
    /// Returns `true` if an entry was replaced.
    pub fn add_template(&mut self, template: ResourceTemplate) -> bool {
        match self
            .templates
            .iter_mut()
            .find(|t| t.pattern() == template.pattern())
        {
            Some(existing) => {
                *existing = template;
                true
            }
            None => {
                self.templates.push(template);
                false
            }
        }
    }

    /// Remove the static resource at `uri`.
    pub fn remove_resource(&mut self, uri: &str) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r.uri() != uri);
        self.resources.len() != before
    }

    /// Remove the template registered under `pattern`.
    pub fn remove_template(&mut self, pattern: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.pattern() != pattern);
        self.templates.len() != before
    }

    /// Static exact match first, then templates in registration order.
    pub fn resolve(&self, uri: &str) -> Option<Resolution> {
        if let Some(resource) = self.resources.iter().find(|r| r.uri() == uri) {
            return Some(Resolution {
                handler: resource.handler().clone(),
                arguments: Arguments::new(),
                matched: MatchedEntry::Static(resource.uri().to_string()),
            });
        }

        self.templates.iter().find_map(|t| {
            t.template().matches(uri).map(|bindings| Resolution {
                handler: t.handler().clone(),
                arguments: to_arguments(&bindings),
                matched: MatchedEntry::Template(t.pattern().to_string()),
            })
        })
    }

    pub fn has_resource(&self, uri: &str) -> bool {
        self.resources.iter().any(|r| r.uri() == uri)
    }

    pub fn has_template(&self, pattern: &str) -> bool {
        self.templates.iter().any(|t| t.pattern() == pattern)
    }

    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        self.resources.iter().map(|r| r.definition().clone()).collect()
    }

    pub fn template_definitions(&self) -> Vec<ResourceTemplateDefinition> {
        self.templates.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.templates.is_empty()
    }
}

/// Merge two definition lists, letting `overlay` entries replace `base`
/// entries with the same key in place; overlay-only entries are appended.
pub fn overlay_definitions<T: Clone>(
    base: Vec<T>,
    overlay: Vec<T>,
    key: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut merged = base;
    for item in overlay {
        match merged.iter().position(|existing| key(existing) == key(&item)) {
            Some(idx) => merged[idx] = item,
            None => merged.push(item),
        }
    }
    merged
}
