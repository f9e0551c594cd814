//! URI template compilation and matching (RFC 6570 subset).
//!
//! Supported expressions: `{var}`, `{var:N}`, `{+var}`, `{/var}`, `{/var*}`,
//! `{?a,b}`, `{?var*}` and `{&...}` continuations. Matching is anchored at
//! both ends and never backtracks: every expression consumes input up to the
//! first occurrence of the literal that follows it, or up to the first
//! character its operator cannot produce. Captured values are
//! percent-decoded before they are bound.

pub mod matcher;
pub mod parser;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub use matcher::{BindingKind, VariableBinding};
pub use parser::{Operator, Part, VarSpec};

use crate::types::{McpError, McpResult};

/// A compiled, immutable URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    pattern: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    /// Compile `pattern`, failing with [`McpError::InvalidTemplate`] when it
    /// cannot be parsed.
    pub fn compile(pattern: &str) -> McpResult<Self> {
        let invalid = |reason: String| McpError::InvalidTemplate {
            pattern: pattern.to_string(),
            reason,
        };

        let parts = parser::parse(pattern).map_err(invalid)?;

        let mut seen = HashSet::new();
        for var in parts.iter().flat_map(variables_of) {
            if !seen.insert(var.name.as_str()) {
                return Err(invalid(format!("variable '{}' appears twice", var.name)));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            parts,
        })
    }

    /// The source pattern; also the registry key.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled parts in pattern order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Variable names in pattern order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .flat_map(variables_of)
            .map(|v| v.name.as_str())
            .collect()
    }

    /// Match a concrete URI. `None` means the URI is not in this template's
    /// family; `Some` holds one binding per participating variable.
    pub fn matches(&self, uri: &str) -> Option<Vec<VariableBinding>> {
        matcher::match_parts(&self.parts, uri)
    }

    /// Whether `uri` matches, discarding the bindings.
    pub fn is_match(&self, uri: &str) -> bool {
        self.matches(uri).is_some()
    }
}

fn variables_of(part: &Part) -> &[VarSpec] {
    match part {
        Part::Literal(_) => &[],
        Part::Expression { variables, .. } => variables,
    }
}

impl FromStr for UriTemplate {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for UriTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for UriTemplate {}
