//! Conversion of template bindings into handler-facing arguments.

use std::collections::BTreeMap;

use crate::types::{Argument, Arguments};
use crate::uri_template::{BindingKind, VariableBinding};

/// Build the argument map for a successful match. Every binding yields
/// exactly one entry; variables without a binding are simply absent.
pub fn to_arguments(bindings: &[VariableBinding]) -> Arguments {
    bindings
        .iter()
        .map(|b| (b.name.clone(), coerce(b)))
        .collect()
}

/// Coerce a single binding.
///
/// | kind     | raw values    | argument                 |
/// |----------|---------------|--------------------------|
/// | Literal  | ≥1            | first value              |
/// | Literal  | 0             | `""`                     |
/// | List     | ≥1            | list in capture order    |
/// | List     | 0             | `""`                     |
/// | KeyValue | even, >0      | map, last write wins     |
/// | KeyValue | 0 or odd      | `""`                     |
pub fn coerce(binding: &VariableBinding) -> Argument {
    let values = &binding.raw_values;
    match binding.kind {
        BindingKind::Literal => values
            .first()
            .cloned()
            .map(Argument::Text)
            .unwrap_or_default(),
        BindingKind::List if !values.is_empty() => Argument::List(values.clone()),
        BindingKind::KeyValue if !values.is_empty() && values.len() % 2 == 0 => {
            let map: BTreeMap<String, String> = values
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            Argument::Map(map)
        }
        BindingKind::List | BindingKind::KeyValue => Argument::default(),
    }
}

impl Default for Argument {
    fn default() -> Self {
        Argument::Text(String::new())
    }
}
