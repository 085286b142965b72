use serde_json::Value;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, GrammarResult};
use crate::grammar::kind::{Field, FieldKind};
use crate::grammar::linker;
use crate::grammar::pattern::{Pattern, PatternValue};
use crate::grammar::raw::{RawGrammar, RawScope};
use crate::grammar::structured::{Captures, ExtraValue, FieldValue, Grammar, Scope};

/// Converts a JSON grammar into its typed form.
///
/// This is best effort: patterns that don't compile and fields we don't know are
/// dropped and reported in `diagnostics`. Only repository name collisions and captures
/// keys that are not integers abort the import.
pub fn import_grammar(raw: &RawGrammar, diagnostics: &mut Diagnostics) -> GrammarResult<Grammar> {
    // The repository goes first so its names are known before the root rules
    let repository = linker::import_repository(&raw.repository, diagnostics)?;

    let mut patterns = Vec::with_capacity(raw.patterns.len());
    for (i, scope) in raw.patterns.iter().enumerate() {
        patterns.push(import_scope(scope, &format!("patterns[{i}]"), diagnostics)?);
    }

    let mut extra = Vec::new();
    for (key, value) in &raw.extra {
        diagnostics.warn(key.as_str(), DiagnosticKind::UnrecognizedField);
        match naive_value(value) {
            Some(value) => extra.push((key.clone(), value)),
            None => diagnostics.error(
                key.as_str(),
                DiagnosticKind::UnexpectedValue {
                    expected: "a string or an array of strings",
                },
            ),
        }
    }

    Ok(Grammar {
        name: raw.name.clone(),
        scope_name: raw.scope_name.clone(),
        injection_selector: raw.injection_selector.clone(),
        patterns,
        repository,
        extra,
    })
}

/// Root fields we don't model survive only if they are a string or a list of strings.
fn naive_value(value: &Value) -> Option<ExtraValue> {
    match value {
        Value::String(s) => Some(ExtraValue::Text(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(ExtraValue::List),
        _ => None,
    }
}

/// Converts a single JSON rule, `path` being its location for diagnostics.
pub fn import_scope(
    raw: &RawScope,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> GrammarResult<Scope> {
    let mut scope = Scope::default();
    let mut dropped_delimiter = false;

    for (key, value) in raw {
        let field_path = format!("{path}.{key}");
        let Some(field) = Field::from_key(key) else {
            diagnostics.warn(field_path, DiagnosticKind::UnrecognizedField);
            continue;
        };

        let imported = match field.kind() {
            FieldKind::Pattern => import_pattern(field, value, &field_path, diagnostics),
            FieldKind::Label => {
                expect_str(value, &field_path, diagnostics).map(|s| FieldValue::Label(s.to_string()))
            }
            FieldKind::Captures => import_captures(value, &field_path, diagnostics)?,
            FieldKind::Children => import_children(value, &field_path, diagnostics)?,
        };

        match imported {
            Some(imported) => scope.set(field, imported),
            None => dropped_delimiter |= matches!(field, Field::Begin | Field::End | Field::While),
        }
    }

    // A dropped delimiter must not leave a half rule behind
    if dropped_delimiter {
        for field in scope.strip_unpaired() {
            diagnostics.error(
                format!("{path}.{}", field.key()),
                DiagnosticKind::UnpairedDelimiter,
            );
        }
    }

    Ok(scope)
}

fn expect_str<'v>(value: &'v Value, path: &str, diagnostics: &mut Diagnostics) -> Option<&'v str> {
    if let Some(s) = value.as_str() {
        Some(s)
    } else {
        diagnostics.error(path, DiagnosticKind::UnexpectedValue { expected: "a string" });
        None
    }
}

fn import_pattern(
    field: Field,
    value: &Value,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> Option<FieldValue> {
    let text = expect_str(value, path, diagnostics)?;
    let pattern = Pattern::new(text);

    // Backreferences only resolve against the captures of the matching `begin`
    if matches!(field, Field::End | Field::While) && pattern.has_backreferences() {
        return Some(FieldValue::Pattern(PatternValue::Compiled(pattern)));
    }

    match pattern.validate() {
        Ok(()) => Some(FieldValue::Pattern(PatternValue::Compiled(pattern))),
        Err(err) => {
            diagnostics.error(
                path,
                DiagnosticKind::MalformedPattern {
                    pattern: text.to_string(),
                    message: err.to_string(),
                },
            );
            None
        }
    }
}

fn import_captures(
    value: &Value,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> GrammarResult<Option<FieldValue>> {
    let Some(map) = value.as_object() else {
        diagnostics.error(path, DiagnosticKind::UnexpectedValue { expected: "an object" });
        return Ok(None);
    };

    let mut captures = Captures::new();
    for (key, value) in map {
        let index = key.parse::<u32>().map_err(|_| Error::CapturesKey {
            path: path.to_string(),
            key: key.clone(),
        })?;
        let capture_path = format!("{path}.{key}");
        let Some(rule) = value.as_object() else {
            diagnostics.error(capture_path, DiagnosticKind::UnexpectedValue { expected: "an object" });
            continue;
        };
        captures.insert(index, import_scope(rule, &capture_path, diagnostics)?);
    }

    Ok(Some(FieldValue::Captures(captures)))
}

fn import_children(
    value: &Value,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> GrammarResult<Option<FieldValue>> {
    let Some(items) = value.as_array() else {
        diagnostics.error(path, DiagnosticKind::UnexpectedValue { expected: "an array" });
        return Ok(None);
    };

    let mut children = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let child_path = format!("{path}[{i}]");
        let Some(rule) = item.as_object() else {
            diagnostics.error(child_path, DiagnosticKind::UnexpectedValue { expected: "an object" });
            continue;
        };
        children.push(import_scope(rule, &child_path, diagnostics)?);
    }

    Ok(Some(FieldValue::Children(children)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn raw_scope(json: &str) -> RawScope {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_imports_match_rule() {
        let raw = RawGrammar::from_json(
            r#"{"name": "Foo", "scopeName": "source.foo", "patterns": [{"match": "a+", "name": "kw.foo"}]}"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();
        let grammar = import_grammar(&raw, &mut diagnostics).unwrap();

        assert!(diagnostics.is_empty());
        assert_eq!(grammar.name, "Foo");
        assert_eq!(grammar.scope_name, "source.foo");
        assert_eq!(grammar.patterns.len(), 1);
        let scope = &grammar.patterns[0];
        let pattern = scope.match_.as_ref().and_then(PatternValue::as_pattern).unwrap();
        assert_eq!(pattern.source(), "a+");
        assert_eq!(scope.name.as_deref(), Some("kw.foo"));
    }

    #[test]
    fn test_malformed_pattern_is_dropped_not_fatal() {
        let raw = raw_scope(r#"{"match": "(a", "name": "kw.foo", "captures": {"1": {"name": "x"}}}"#);
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "patterns[0]", &mut diagnostics).unwrap();

        assert!(scope.match_.is_none());
        assert_eq!(scope.name.as_deref(), Some("kw.foo"));
        assert!(scope.captures.is_some());
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.path, "patterns[0].match");
        assert_eq!(diagnostic.severity, Severity::Error);
        assert!(matches!(diagnostic.kind, DiagnosticKind::MalformedPattern { .. }));
    }

    #[test]
    fn test_malformed_end_takes_its_begin_along() {
        let raw = raw_scope(r#"{"begin": "\\(", "end": "(unclosed", "name": "meta.parens"}"#);
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "patterns[0]", &mut diagnostics).unwrap();

        assert_eq!(
            scope,
            Scope {
                name: Some("meta.parens".into()),
                ..Scope::default()
            }
        );
        assert!(scope.validate("patterns[0]").is_ok());
        let kinds: Vec<_> = diagnostics.iter().map(|d| (d.path.as_str(), &d.kind)).collect();
        assert!(matches!(
            kinds.as_slice(),
            [
                ("patterns[0].end", DiagnosticKind::MalformedPattern { .. }),
                ("patterns[0].begin", DiagnosticKind::UnpairedDelimiter),
            ]
        ));
    }

    #[test]
    fn test_end_with_backreference_is_kept() {
        let raw = raw_scope(
            r#"{"begin": "(<<)(\\w+)", "end": "^\\2$", "contentName": "string.unquoted.heredoc"}"#,
        );
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "p", &mut diagnostics).unwrap();

        assert!(diagnostics.is_empty());
        let end = scope.end.as_ref().and_then(PatternValue::as_pattern).unwrap();
        assert_eq!(end.source(), "^\\2$");
        assert!(scope.validate("p").is_ok());
    }

    #[test]
    fn test_backreference_outside_end_is_still_checked() {
        let raw = raw_scope(r#"{"match": "\\1x"}"#);
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "p", &mut diagnostics).unwrap();

        assert!(scope.match_.is_none());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_unrecognized_fields_are_dropped() {
        let raw = raw_scope(
            r#"{"comment": "numbers", "match": "[0-9]+", "applyEndPatternLast": 1}"#,
        );
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "repository.num", &mut diagnostics).unwrap();

        assert_eq!(
            scope,
            Scope {
                match_: Some(Pattern::new("[0-9]+").into()),
                ..Scope::default()
            }
        );
        let paths: Vec<_> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["repository.num.comment", "repository.num.applyEndPatternLast"]
        );
    }

    #[test]
    fn test_wrongly_typed_values_are_dropped() {
        let raw = raw_scope(r#"{"name": 3, "patterns": [{"match": "x"}, "oops"], "captures": []}"#);
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "p", &mut diagnostics).unwrap();

        assert!(scope.name.is_none());
        assert!(scope.captures.is_none());
        assert_eq!(scope.patterns.as_ref().map(Vec::len), Some(1));
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_captures_are_keyed_by_integer() {
        let raw = raw_scope(
            r#"{"match": "(a)(b)(c)", "captures": {"0": {"name": "a"}, "2": {"name": "b"}, "1": {"name": "c"}}}"#,
        );
        let mut diagnostics = Diagnostics::new();
        let scope = import_scope(&raw, "p", &mut diagnostics).unwrap();
        let captures = scope.captures.unwrap();

        let indexes: Vec<_> = captures.iter().map(|(i, _)| i).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(captures.get(2).and_then(|s| s.name.as_deref()), Some("b"));
        assert_eq!(captures.get(1).and_then(|s| s.name.as_deref()), Some("c"));
    }

    #[test]
    fn test_non_integer_captures_key_is_fatal() {
        let raw = raw_scope(r#"{"match": "(a)", "captures": {"first": {"name": "a"}}}"#);
        let err = import_scope(&raw, "patterns[3]", &mut Diagnostics::new()).unwrap_err();
        match err {
            Error::CapturesKey { path, key } => {
                assert_eq!(path, "patterns[3].captures");
                assert_eq!(key, "first");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_include_is_copied_as_is() {
        let raw = RawGrammar::from_json(
            r##"{
                "name": "Foo",
                "scopeName": "source.foo",
                "patterns": [{"include": "#num"}],
                "repository": {"num": {"match": "[0-9]+"}}
            }"##,
        )
        .unwrap();
        let grammar = import_grammar(&raw, &mut Diagnostics::new()).unwrap();

        assert_eq!(grammar.patterns[0].include.as_deref(), Some("#num"));
        assert_eq!(grammar.repository.len(), 1);
        assert!(grammar.repository.get("num").unwrap().match_.is_some());
    }

    #[test]
    fn test_root_fallback_keeps_strings_and_string_lists() {
        let raw = RawGrammar::from_json(
            r#"{
                "name": "Foo",
                "scopeName": "source.foo",
                "fileTypes": ["foo", "fo"],
                "firstLineMatch": "^#!.*foo",
                "information_for_contributors": [1, 2],
                "injections": {}
            }"#,
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();
        let grammar = import_grammar(&raw, &mut diagnostics).unwrap();

        assert_eq!(
            grammar.extra,
            vec![
                (
                    "fileTypes".to_string(),
                    ExtraValue::List(vec!["foo".to_string(), "fo".to_string()])
                ),
                ("firstLineMatch".to_string(), ExtraValue::Text("^#!.*foo".to_string())),
            ]
        );
        // one warning per unknown key, one error per discarded one
        assert_eq!(diagnostics.len(), 6);
        assert_eq!(
            diagnostics.iter().filter(|d| d.severity == Severity::Error).count(),
            2
        );
    }
}
