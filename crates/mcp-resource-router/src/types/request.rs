//! Request parameter types for the resource methods.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parameters for resources/read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceReadParams {
    /// Resource URI.
    pub uri: String,
}

/// Cursor-based pagination for list operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// Cursor for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// A resolved template variable as seen by a resource handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    /// A single decoded value, or the empty-string fallback.
    Text(String),
    /// Exploded path segments in capture order.
    List(Vec<String>),
    /// Exploded form-style key/value pairs.
    Map(BTreeMap<String, String>),
}

impl Argument {
    /// The scalar value, if this argument is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The segment list, if this argument is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Argument::List(v) => Some(v),
            _ => None,
        }
    }

    /// The key/value map, if this argument is a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Argument::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Text(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Text(value)
    }
}

impl From<Vec<String>> for Argument {
    fn from(value: Vec<String>) -> Self {
        Argument::List(value)
    }
}

/// Argument map keyed by variable name. Only variables that took part in
/// the match appear as keys.
pub type Arguments = BTreeMap<String, Argument>;

/// The request a resource handler receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceRequest {
    /// The URI exactly as requested by the client.
    pub uri: String,
    /// Template variables extracted from `uri`; empty for static resources.
    #[serde(default)]
    pub arguments: Arguments,
}

impl ReadResourceRequest {
    /// Look up a single argument by variable name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }
}
