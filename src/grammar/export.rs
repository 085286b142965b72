use serde_json::{Map, Value};

use crate::grammar::linker;
use crate::grammar::raw::{RawGrammar, RawScope};
use crate::grammar::structured::{ExtraValue, FieldRef, Grammar, Scope};

/// Converts a typed grammar back to a JSON grammar.
///
/// This cannot fail and reports nothing: every value of the typed form has a JSON
/// representation. Patterns are written as their text, flags group included.
pub fn export_grammar(grammar: &Grammar) -> RawGrammar {
    let extra = grammar
        .extra
        .iter()
        .map(|(key, value)| {
            let value = match value {
                ExtraValue::Text(s) => Value::String(s.clone()),
                ExtraValue::List(items) => {
                    Value::Array(items.iter().cloned().map(Value::String).collect())
                }
            };
            (key.clone(), value)
        })
        .collect();

    RawGrammar {
        name: grammar.name.clone(),
        scope_name: grammar.scope_name.clone(),
        injection_selector: grammar.injection_selector.clone(),
        patterns: grammar.patterns.iter().map(export_scope).collect(),
        repository: linker::export_repository(&grammar.repository),
        extra,
    }
}

/// Converts a single typed rule, walking its fields in canonical order.
pub fn export_scope(scope: &Scope) -> RawScope {
    let mut out = Map::new();

    for (field, value) in scope.fields() {
        let value = match value {
            FieldRef::Pattern(pattern) => Value::String(pattern.to_text()),
            FieldRef::Label(label) => Value::String(label.to_string()),
            FieldRef::Captures(captures) => Value::Object(
                captures
                    .iter()
                    .map(|(index, scope)| (index.to_string(), Value::Object(export_scope(scope))))
                    .collect(),
            ),
            FieldRef::Children(children) => Value::Array(
                children
                    .iter()
                    .map(|scope| Value::Object(export_scope(scope)))
                    .collect(),
            ),
        };
        out.insert(field.key().to_string(), value);
    }

    out
}
