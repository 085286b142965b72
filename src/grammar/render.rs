//! Renders the typed form as Rust source code building it through this crate's API.
//!
//! The output is laid out with a fixed 4 spaces indent and is valid Rust on its own;
//! passing it through a [`Formatter`](crate::Formatter) only canonicalizes the layout.

use std::collections::BTreeSet;

use crate::grammar::kind::Field;
use crate::grammar::pattern::PatternValue;
use crate::grammar::structured::{Captures, ExtraValue, FieldRef, Grammar, Scope};

const INDENT: &str = "    ";

/// Rust keywords, strict and reserved, that can't be used as function names.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Turns a repository entry name into a snake case Rust identifier.
///
/// `string-double` becomes `string_double`, `typeName` becomes `type_name` and keywords
/// get a trailing underscore like `Scope::match_`.
pub fn rust_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }

    if !out.chars().any(|c| c.is_ascii_alphanumeric()) || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "rule_");
    }
    if KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// A Rust string literal for `text`: raw when possible so regexes stay readable.
pub fn raw_literal(text: &str) -> String {
    // Bare carriage returns are not allowed in raw strings
    if text.contains('\r') {
        return format!("{text:?}");
    }

    let mut hashes = 0;
    let mut run: Option<usize> = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            hashes = hashes.max(n + 1);
        }
    }

    let hashes = "#".repeat(hashes);
    format!("r{hashes}\"{text}\"{hashes}")
}

/// Accumulates source text and the crate items it refers to.
#[derive(Debug, Default)]
struct SourceWriter {
    out: String,
    uses: BTreeSet<&'static str>,
}

impl SourceWriter {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn uses(&mut self, item: &'static str) {
        self.uses.insert(item);
    }

    /// The `use` line for everything referenced so far.
    fn use_line(&self) -> String {
        let items: Vec<_> = self.uses.iter().copied().collect();
        format!("use tmgrammar::{{{}}};\n", items.join(", "))
    }

    /// Writes `Scope { .. }` with fields one level deeper than `depth`.
    fn scope(&mut self, scope: &Scope, depth: usize) {
        self.uses("Scope");
        let fields: Vec<_> = scope.fields().collect();
        if fields.is_empty() {
            self.push("Scope::default()");
            return;
        }

        self.push("Scope {");
        for (field, value) in &fields {
            self.newline(depth + 1);
            self.push(field.ident());
            self.push(": Some(");
            self.field_value(*value, depth + 1);
            self.push("),");
        }
        if fields.len() < Field::ALL.len() {
            self.newline(depth + 1);
            self.push("..Scope::default()");
        }
        self.newline(depth);
        self.push("}");
    }

    fn field_value(&mut self, value: FieldRef<'_>, depth: usize) {
        match value {
            FieldRef::Pattern(PatternValue::Compiled(pattern)) => {
                self.uses("Pattern");
                self.push(&format!("Pattern::new({}).into()", raw_literal(&pattern.to_text())));
            }
            FieldRef::Pattern(PatternValue::Text(text)) => {
                self.uses("PatternValue");
                self.push(&format!("PatternValue::Text({}.into())", raw_literal(text)));
            }
            FieldRef::Label(label) => self.push(&format!("{label:?}.into()")),
            FieldRef::Captures(captures) => self.captures(captures, depth),
            FieldRef::Children(children) => self.children(children, depth),
        }
    }

    fn captures(&mut self, captures: &Captures, depth: usize) {
        self.uses("Captures");
        if captures.is_empty() {
            self.push("Captures::new()");
            return;
        }

        self.push("Captures::from([");
        for (index, scope) in captures.iter() {
            self.newline(depth + 1);
            self.push(&format!("({index}, "));
            self.scope(scope, depth + 1);
            self.push("),");
        }
        self.newline(depth);
        self.push("])");
    }

    fn children(&mut self, children: &[Scope], depth: usize) {
        if children.is_empty() {
            self.push("vec![]");
            return;
        }

        self.push("vec![");
        for scope in children {
            self.newline(depth + 1);
            self.scope(scope, depth + 1);
            self.push(",");
        }
        self.newline(depth);
        self.push("]");
    }

    fn extra(&mut self, extra: &[(String, ExtraValue)], depth: usize) {
        self.uses("ExtraValue");
        self.push("vec![");
        for (key, value) in extra {
            self.newline(depth + 1);
            let value = match value {
                ExtraValue::Text(s) => format!("ExtraValue::Text({s:?}.into())"),
                ExtraValue::List(items) => {
                    let items: Vec<_> = items.iter().map(|s| format!("{s:?}.into()")).collect();
                    format!("ExtraValue::List(vec![{}])", items.join(", "))
                }
            };
            self.push(&format!("({key:?}.into(), {value}),"));
        }
        self.newline(depth);
        self.push("]");
    }
}

/// Renders a rule as a Rust expression, without `use` lines.
pub fn render_scope(scope: &Scope) -> String {
    let mut writer = SourceWriter::default();
    writer.scope(scope, 0);
    writer.out
}

/// Renders the module of a single repository entry: `pub fn <ident>() -> Scope`.
pub fn render_repository_unit(ident: &str, scope: &Scope) -> String {
    let mut writer = SourceWriter::default();
    writer.push(&format!("pub fn {ident}() -> Scope {{"));
    writer.newline(1);
    writer.scope(scope, 1);
    writer.newline(0);
    writer.push("}\n");

    format!("{}\n{}", writer.use_line(), writer.out)
}

/// Renders the repository index module, re-exporting every entry.
pub fn render_repository_index<'a>(idents: impl IntoIterator<Item = &'a str> + Clone) -> String {
    let mut out = String::new();
    for ident in idents.clone() {
        out.push_str(&format!("mod {ident};\n"));
    }
    out.push('\n');
    for ident in idents {
        out.push_str(&format!("pub use {ident}::{ident};\n"));
    }
    out
}

/// Renders the primary module: `pub fn grammar() -> Result<Grammar, Error>`.
///
/// `repository` pairs each repository entry name with the identifier of its unit, in
/// the order they are merged back.
pub fn render_grammar(grammar: &Grammar, repository: &[(String, String)]) -> String {
    let mut writer = SourceWriter::default();
    writer.uses("Error");
    writer.uses("Grammar");

    writer.push("pub fn grammar() -> Result<Grammar, Error> {");
    writer.newline(1);
    writer.push("Ok(Grammar {");

    writer.newline(2);
    writer.push(&format!("name: {:?}.into(),", grammar.name));
    writer.newline(2);
    writer.push(&format!("scope_name: {:?}.into(),", grammar.scope_name));

    let mut complete = true;
    match &grammar.injection_selector {
        Some(selector) => {
            writer.newline(2);
            writer.push(&format!("injection_selector: Some({selector:?}.into()),"));
        }
        None => complete = false,
    }

    writer.newline(2);
    writer.push("patterns: ");
    writer.children(&grammar.patterns, 2);
    writer.push(",");

    if repository.is_empty() {
        complete = false;
    } else {
        writer.uses("Repository");
        writer.newline(2);
        writer.push("repository: Repository::merge([");
        for (name, ident) in repository {
            writer.newline(3);
            writer.push(&format!("({name:?}, repository::{ident}()),"));
        }
        writer.newline(2);
        writer.push("])?,");
    }

    if grammar.extra.is_empty() {
        complete = false;
    } else {
        writer.newline(2);
        writer.push("extra: ");
        writer.extra(&grammar.extra, 2);
        writer.push(",");
    }

    if !complete {
        writer.newline(2);
        writer.push("..Grammar::default()");
    }
    writer.newline(1);
    writer.push("})");
    writer.newline(0);
    writer.push("}\n");

    let mut out = writer.use_line();
    if !repository.is_empty() {
        out.push_str("\npub mod repository;\n");
    }
    out.push('\n');
    out.push_str(&writer.out);
    out
}
