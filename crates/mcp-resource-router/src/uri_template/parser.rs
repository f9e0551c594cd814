//! Template pattern parsing into literal and expression parts.

/// Expression operator, selected by the first character inside `{...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `{var}`
    Simple,
    /// `{+var}`
    Reserved,
    /// `{/var}`
    Path,
    /// `{?var}`
    Query,
    /// `{&var}`
    QueryContinuation,
}

impl Operator {
    /// Character that introduces this operator's expansion in a URI.
    pub fn lead(self) -> Option<char> {
        match self {
            Operator::Simple | Operator::Reserved => None,
            Operator::Path => Some('/'),
            Operator::Query => Some('?'),
            Operator::QueryContinuation => Some('&'),
        }
    }

    /// Whether an expansion of this operator can never contain `c`.
    pub fn stops_at(self, c: char) -> bool {
        match self {
            Operator::Simple => matches!(c, '/' | '?' | '#'),
            Operator::Reserved | Operator::Path => matches!(c, '?' | '#'),
            Operator::Query | Operator::QueryContinuation => c == '#',
        }
    }
}

/// One variable inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    pub name: String,
    /// `*` modifier.
    pub explode: bool,
    /// `:N` prefix modifier.
    pub max_length: Option<usize>,
}

/// A compiled template is a sequence of these. Two literals are never adjacent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    Expression {
        operator: Operator,
        variables: Vec<VarSpec>,
    },
}

const MAX_PREFIX: usize = 10_000;

/// Split `pattern` into parts. The error is a human-readable reason.
pub fn parse(pattern: &str) -> Result<Vec<Part>, String> {
    let mut parts = Vec::new();
    let mut rest = pattern;
    let mut offset = 0;

    while !rest.is_empty() {
        let Some(pos) = rest.find(['{', '}']) else {
            parts.push(Part::Literal(rest.to_string()));
            break;
        };

        if rest[pos..].starts_with('}') {
            return Err(format!("unmatched '}}' at offset {}", offset + pos));
        }
        if pos > 0 {
            parts.push(Part::Literal(rest[..pos].to_string()));
        }

        let after = &rest[pos + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unclosed expression at offset {}", offset + pos))?;
        let body = &after[..close];
        if body.contains('{') {
            return Err(format!("nested '{{' at offset {}", offset + pos));
        }
        push_expression(&mut parts, parse_expression(body)?)?;

        let consumed = pos + 1 + close + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }

    Ok(parts)
}

/// `{?a}{&b}` is folded into a single form expression so that one query
/// string is matched against all of its named variables.
fn push_expression(parts: &mut Vec<Part>, part: Part) -> Result<(), String> {
    if let (
        Some(Part::Expression {
            operator: Operator::Query | Operator::QueryContinuation,
            variables: previous,
        }),
        Part::Expression {
            operator: Operator::QueryContinuation,
            variables,
        },
    ) = (parts.last_mut(), &part)
    {
        if let Some(exploded) = previous.iter().find(|v| v.explode) {
            return Err(format!(
                "exploded variable '{}' must be last in its query",
                exploded.name
            ));
        }
        previous.extend(variables.iter().cloned());
        return Ok(());
    }

    parts.push(part);
    Ok(())
}

fn parse_expression(body: &str) -> Result<Part, String> {
    let mut chars = body.chars();
    let (operator, list) = match chars.next() {
        None => return Err("empty expression".to_string()),
        Some('+') => (Operator::Reserved, chars.as_str()),
        Some('/') => (Operator::Path, chars.as_str()),
        Some('?') => (Operator::Query, chars.as_str()),
        Some('&') => (Operator::QueryContinuation, chars.as_str()),
        Some(c @ ('#' | '.' | ';' | '=' | ',' | '!' | '@' | '|')) => {
            return Err(format!("unsupported operator '{c}'"));
        }
        Some(_) => (Operator::Simple, body),
    };

    if list.is_empty() {
        return Err(format!("expression '{{{body}}}' has no variables"));
    }

    let variables = list
        .split(',')
        .map(parse_varspec)
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(idx) = variables.iter().position(|v| v.explode) {
        if idx != variables.len() - 1 {
            return Err(format!(
                "exploded variable '{}' must be last in its expression",
                variables[idx].name
            ));
        }
    }

    Ok(Part::Expression {
        operator,
        variables,
    })
}

fn parse_varspec(spec: &str) -> Result<VarSpec, String> {
    let (name, explode, max_length) = if let Some(name) = spec.strip_suffix('*') {
        (name, true, None)
    } else if let Some((name, len)) = spec.split_once(':') {
        let n: usize = len
            .parse()
            .map_err(|_| format!("invalid prefix length '{len}' on '{name}'"))?;
        if n == 0 || n >= MAX_PREFIX {
            return Err(format!("prefix length {n} on '{name}' out of range"));
        }
        (name, false, Some(n))
    } else {
        (spec, false, None)
    };

    validate_name(name)?;

    Ok(VarSpec {
        name: name.to_string(),
        explode,
        max_length,
    })
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty variable name".to_string());
    }
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err(format!("invalid variable name '{name}'"));
    }

    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3);
                if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                    return Err(format!("bad percent-encoding in variable name '{name}'"));
                }
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => i += 1,
            _ => return Err(format!("invalid character in variable name '{name}'")),
        }
    }
    Ok(())
}
