//! Anchored, non-backtracking matching of a URI against compiled parts.

use percent_encoding::percent_decode_str;

use super::parser::{Operator, Part, VarSpec};

/// Shape of the value captured for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// A single value.
    Literal,
    /// Exploded path segments.
    List,
    /// Alternating key/value tokens from a form-style expansion.
    KeyValue,
}

/// The result of binding one template variable during a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: String,
    pub kind: BindingKind,
    /// Percent-decoded captures, in capture order.
    pub raw_values: Vec<String>,
}

impl VariableBinding {
    pub fn new(name: impl Into<String>, kind: BindingKind, raw_values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            raw_values,
        }
    }
}

/// Match `uri` against `parts`. Returns bindings in capture order, or `None`
/// when the URI is not a member of the template's family.
pub fn match_parts(parts: &[Part], uri: &str) -> Option<Vec<VariableBinding>> {
    let mut bindings = Vec::new();
    let mut pos = 0;

    for (idx, part) in parts.iter().enumerate() {
        let rest = &uri[pos..];
        match part {
            Part::Literal(literal) => {
                if !rest.starts_with(literal.as_str()) {
                    return None;
                }
                pos += literal.len();
            }
            Part::Expression {
                operator,
                variables,
            } => {
                let stop = rest
                    .find(|c: char| operator.stops_at(c))
                    .unwrap_or(rest.len());
                let end = match parts.get(idx + 1) {
                    Some(Part::Literal(next)) => rest[..stop].find(next.as_str()).unwrap_or(stop),
                    _ => stop,
                };
                bind_expression(*operator, variables, &rest[..end], &mut bindings)?;
                pos += end;
            }
        }
    }

    (pos == uri.len()).then_some(bindings)
}

/// Lossy: escapes that do not form valid UTF-8 (e.g. `%FF`) decode to
/// U+FFFD rather than failing the match.
fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn within_prefix(var: &VarSpec, value: &str) -> bool {
    var.max_length
        .map_or(true, |max| value.chars().count() <= max)
}

fn literal(var: &VarSpec, raw: &str) -> Option<VariableBinding> {
    let value = decode(raw);
    if !within_prefix(var, &value) {
        return None;
    }
    let raw_values = if value.is_empty() { Vec::new() } else { vec![value] };
    Some(VariableBinding::new(&var.name, BindingKind::Literal, raw_values))
}

fn bind_expression(
    operator: Operator,
    variables: &[VarSpec],
    span: &str,
    out: &mut Vec<VariableBinding>,
) -> Option<()> {
    match operator {
        Operator::Simple | Operator::Reserved => bind_simple(variables, span, out),
        Operator::Path => bind_path(variables, span, out),
        Operator::Query | Operator::QueryContinuation => {
            bind_form(operator, variables, span, out)
        }
    }
}

/// `{a,b}` / `{+a}`: comma-separated values assigned in order.
fn bind_simple(variables: &[VarSpec], span: &str, out: &mut Vec<VariableBinding>) -> Option<()> {
    let pieces: Vec<&str> = span.split(',').collect();

    for (idx, var) in variables.iter().enumerate() {
        if var.explode {
            let values = if span.is_empty() {
                Vec::new()
            } else {
                pieces[idx.min(pieces.len())..].iter().map(|p| decode(p)).collect()
            };
            out.push(VariableBinding::new(&var.name, BindingKind::List, values));
            return Some(());
        }
        match pieces.get(idx) {
            Some(piece) => out.push(literal(var, piece)?),
            None => break,
        }
    }

    (pieces.len() <= variables.len()).then_some(())
}

/// `{/a,b}` / `{/path*}`: one segment per variable, exploded variable takes
/// the remainder. An exploded variable always binds, possibly to zero
/// segments.
fn bind_path(variables: &[VarSpec], span: &str, out: &mut Vec<VariableBinding>) -> Option<()> {
    let segments: Vec<&str> = if span.is_empty() {
        Vec::new()
    } else {
        span.strip_prefix('/')?.split('/').collect()
    };

    for (idx, var) in variables.iter().enumerate() {
        if var.explode {
            let mut remaining = segments.get(idx..).unwrap_or_default();
            // `/name/v1/v2` form: the leading label names the variable itself.
            if remaining.first().is_some_and(|first| decode(first) == var.name) {
                remaining = &remaining[1..];
            }
            let values = remaining.iter().map(|s| decode(s)).collect();
            out.push(VariableBinding::new(&var.name, BindingKind::List, values));
            return Some(());
        }
        match segments.get(idx) {
            Some(segment) => out.push(literal(var, segment)?),
            None => break,
        }
    }

    (segments.len() <= variables.len()).then_some(())
}

/// `{?a,b}` / `{?rest*}`: named variables pick their key; an exploded
/// variable collects every unclaimed pair. Without the lead character the
/// whole expression is absent.
fn bind_form(
    operator: Operator,
    variables: &[VarSpec],
    span: &str,
    out: &mut Vec<VariableBinding>,
) -> Option<()> {
    if span.is_empty() {
        return Some(());
    }
    let lead = operator.lead()?;
    let body = span.strip_prefix(lead)?;

    let pairs: Vec<(String, String)> = body
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (decode(k), decode(v)),
            None => (decode(p), String::new()),
        })
        .collect();
    let mut claimed = vec![false; pairs.len()];

    for var in variables {
        if var.explode {
            let mut values = Vec::new();
            for (i, (k, v)) in pairs.iter().enumerate() {
                if !claimed[i] {
                    values.push(k.clone());
                    values.push(v.clone());
                }
            }
            out.push(VariableBinding::new(&var.name, BindingKind::KeyValue, values));
            continue;
        }

        if let Some(i) = pairs.iter().rposition(|(k, _)| *k == var.name) {
            for (j, (k, _)) in pairs.iter().enumerate() {
                if *k == var.name {
                    claimed[j] = true;
                }
            }
            let value = &pairs[i].1;
            if !within_prefix(var, value) {
                return None;
            }
            out.push(VariableBinding::new(
                &var.name,
                BindingKind::Literal,
                vec![value.clone()],
            ));
        }
    }

    Some(())
}
