use std::collections::BTreeMap;
use std::convert::Infallible;

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, GrammarResult};
use crate::grammar::kind::{Field, FieldKind};
use crate::grammar::pattern::PatternValue;

/// A single rule of a grammar: a `match` rule, a `begin`/`end` or `begin`/`while` region,
/// an include or a plain container of nested rules.
///
/// Every field is optional and absent fields stay absent through a conversion, so
/// `patterns: Some(vec![])` and `patterns: None` are different rules.
///
/// # Examples
/// ```
/// use tmgrammar::{Pattern, Scope};
///
/// let string = Scope {
///     name: Some("string.quoted.double.foo".into()),
///     begin: Some(Pattern::new(r#"""#).into()),
///     end: Some(Pattern::new(r#"""#).into()),
///     patterns: Some(vec![Scope {
///         match_: Some(Pattern::new(r"\\.").into()),
///         name: Some("constant.character.escape.foo".into()),
///         ..Scope::default()
///     }]),
///     ..Scope::default()
/// };
/// assert!(string.validate("string").is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// `#name` for a repository entry of this grammar, or another grammar's scope name
    pub include: Option<String>,
    pub match_: Option<PatternValue>,
    pub begin: Option<PatternValue>,
    pub end: Option<PatternValue>,
    pub while_: Option<PatternValue>,
    pub name: Option<String>,
    pub content_name: Option<String>,
    pub captures: Option<Captures>,
    pub begin_captures: Option<Captures>,
    pub end_captures: Option<Captures>,
    pub while_captures: Option<Captures>,
    pub patterns: Option<Vec<Scope>>,
}

/// Borrowed value of one rule field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Pattern(&'a PatternValue),
    Label(&'a str),
    Captures(&'a Captures),
    Children(&'a [Scope]),
}

/// Owned value of one rule field, as produced by the importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldValue {
    Pattern(PatternValue),
    Label(String),
    Captures(Captures),
    Children(Vec<Scope>),
}

impl FieldValue {
    fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Pattern(_) => FieldKind::Pattern,
            FieldValue::Label(_) => FieldKind::Label,
            FieldValue::Captures(_) => FieldKind::Captures,
            FieldValue::Children(_) => FieldKind::Children,
        }
    }
}

impl Scope {
    pub fn get(&self, field: Field) -> Option<FieldRef<'_>> {
        match field {
            Field::Include => self.include.as_deref().map(FieldRef::Label),
            Field::Match => self.match_.as_ref().map(FieldRef::Pattern),
            Field::Begin => self.begin.as_ref().map(FieldRef::Pattern),
            Field::End => self.end.as_ref().map(FieldRef::Pattern),
            Field::While => self.while_.as_ref().map(FieldRef::Pattern),
            Field::Name => self.name.as_deref().map(FieldRef::Label),
            Field::ContentName => self.content_name.as_deref().map(FieldRef::Label),
            Field::Captures => self.captures.as_ref().map(FieldRef::Captures),
            Field::BeginCaptures => self.begin_captures.as_ref().map(FieldRef::Captures),
            Field::EndCaptures => self.end_captures.as_ref().map(FieldRef::Captures),
            Field::WhileCaptures => self.while_captures.as_ref().map(FieldRef::Captures),
            Field::Patterns => self.patterns.as_deref().map(FieldRef::Children),
        }
    }

    /// Sets a field. The value kind has to match the field kind.
    pub(crate) fn set(&mut self, field: Field, value: FieldValue) {
        debug_assert_eq!(field.kind(), value.kind(), "kind mismatch for {}", field.key());
        match (field, value) {
            (Field::Include, FieldValue::Label(v)) => self.include = Some(v),
            (Field::Name, FieldValue::Label(v)) => self.name = Some(v),
            (Field::ContentName, FieldValue::Label(v)) => self.content_name = Some(v),
            (Field::Match, FieldValue::Pattern(v)) => self.match_ = Some(v),
            (Field::Begin, FieldValue::Pattern(v)) => self.begin = Some(v),
            (Field::End, FieldValue::Pattern(v)) => self.end = Some(v),
            (Field::While, FieldValue::Pattern(v)) => self.while_ = Some(v),
            (Field::Captures, FieldValue::Captures(v)) => self.captures = Some(v),
            (Field::BeginCaptures, FieldValue::Captures(v)) => self.begin_captures = Some(v),
            (Field::EndCaptures, FieldValue::Captures(v)) => self.end_captures = Some(v),
            (Field::WhileCaptures, FieldValue::Captures(v)) => self.while_captures = Some(v),
            (Field::Patterns, FieldValue::Children(v)) => self.patterns = Some(v),
            _ => {}
        }
    }

    /// Iterates over the present fields in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, FieldRef<'_>)> {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    /// Checks the shape of this rule and all its nested rules.
    ///
    /// `match` cannot be combined with `begin`, and `begin` needs exactly one of `end`
    /// or `while` (and the other way around).
    pub fn validate(&self, path: &str) -> GrammarResult<()> {
        self.visit(path, &mut |path, scope| scope.validate_shape(path))
    }

    /// Clears `begin`/`end`/`while` fields left without their pair, with their captures,
    /// and returns the fields removed.
    pub(crate) fn strip_unpaired(&mut self) -> Vec<Field> {
        let mut removed = Vec::new();
        let mut clear = |field: Field, present: bool| {
            if present {
                removed.push(field);
            }
        };

        if self.begin.is_none() {
            clear(Field::End, self.end.take().is_some());
            clear(Field::While, self.while_.take().is_some());
            clear(Field::EndCaptures, self.end_captures.take().is_some());
            clear(Field::WhileCaptures, self.while_captures.take().is_some());
        } else if self.end.is_none() && self.while_.is_none() {
            clear(Field::Begin, self.begin.take().is_some());
            clear(Field::BeginCaptures, self.begin_captures.take().is_some());
        }
        removed
    }

    fn validate_shape(&self, path: &str) -> GrammarResult<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidRule {
                path: path.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.match_.is_some() && self.begin.is_some() {
            return invalid("`match` and `begin` cannot be used on the same rule");
        }
        match (&self.begin, &self.end, &self.while_) {
            (Some(_), Some(_), Some(_)) => invalid("`begin` has both an `end` and a `while`"),
            (Some(_), None, None) => invalid("`begin` without `end` or `while`"),
            (None, Some(_), _) => invalid("`end` without `begin`"),
            (None, _, Some(_)) => invalid("`while` without `begin`"),
            _ => Ok(()),
        }
    }

    /// Calls `f` on this rule then on every nested rule, depth first, with the path of
    /// each rule.
    pub(crate) fn visit<'a, E, F>(&'a self, path: &str, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&str, &'a Scope) -> Result<(), E>,
    {
        f(path, self)?;

        for (field, value) in self.fields() {
            match value {
                FieldRef::Captures(captures) => {
                    for (index, scope) in captures.iter() {
                        scope.visit(&format!("{path}.{}.{index}", field.key()), f)?;
                    }
                }
                FieldRef::Children(children) => {
                    for (i, scope) in children.iter().enumerate() {
                        scope.visit(&format!("{path}.{}[{i}]", field.key()), f)?;
                    }
                }
                FieldRef::Pattern(_) | FieldRef::Label(_) => {}
            }
        }

        Ok(())
    }
}

/// Rules applied to the capture groups of a match, keyed by group index.
///
/// Iteration is in ascending group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(BTreeMap<u32, Scope>);

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u32, scope: Scope) -> Option<Scope> {
        self.0.insert(index, scope)
    }

    pub fn get(&self, index: u32) -> Option<&Scope> {
        self.0.get(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Scope)> {
        self.0.iter().map(|(index, scope)| (*index, scope))
    }
}

impl<const N: usize> From<[(u32, Scope); N]> for Captures {
    fn from(entries: [(u32, Scope); N]) -> Self {
        Self(BTreeMap::from(entries))
    }
}

impl FromIterator<(u32, Scope)> for Captures {
    fn from_iter<I: IntoIterator<Item = (u32, Scope)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Named rules of a grammar, referenced elsewhere with `#name` includes.
///
/// Entries keep the order they were added in, but two repositories with the same entries
/// in a different order are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository(IndexMap<String, Scope>);

impl Repository {
    /// Builds a repository from named rules, in the given order.
    ///
    /// Fails if a name is used twice.
    pub fn merge<I, K>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, Scope)>,
        K: Into<String>,
    {
        let mut repository = Repository::default();
        for (name, scope) in entries {
            repository.insert(name, scope)?;
        }
        Ok(repository)
    }

    /// Adds a named rule. Fails if the name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, scope: Scope) -> Result<(), Error> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(Error::RepositoryCollision(name));
        }
        self.0.insert(name, scope);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Scope> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scope)> {
        self.0.iter().map(|(name, scope)| (name.as_str(), scope))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A grammar root field we don't model but can carry over as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraValue {
    Text(String),
    List(Vec<String>),
}

/// A TextMate grammar in its typed form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    /// Human-readable name of the language
    pub name: String,
    /// Unique identifier of this grammar, eg `source.rust`
    pub scope_name: String,
    pub injection_selector: Option<String>,
    /// Root rules, by priority
    pub patterns: Vec<Scope>,
    pub repository: Repository,
    /// Other root fields such as `fileTypes`, in document order
    pub extra: Vec<(String, ExtraValue)>,
}

impl Grammar {
    /// Checks the shape of every rule, see [`Scope::validate`].
    pub fn validate(&self) -> GrammarResult<()> {
        self.visit(&mut |path, scope| scope.validate_shape(path))
    }

    /// Reports every `#name` include that has no entry in the repository.
    ///
    /// Includes of other grammars (`source.js`, `source.js#expr`) and `$self`/`$base`
    /// are not checked.
    pub fn dangling_includes(&self, diagnostics: &mut Diagnostics) -> usize {
        let mut count = 0;
        let Ok(()) = self.visit(&mut |path, scope| {
            if let Some(target) = scope.include.as_deref().and_then(|i| i.strip_prefix('#')) {
                if !self.repository.contains(target) {
                    count += 1;
                    diagnostics.warn(
                        format!("{path}.include"),
                        DiagnosticKind::DanglingInclude {
                            target: target.to_string(),
                        },
                    );
                }
            }
            Ok::<_, Infallible>(())
        });
        count
    }

    fn visit<'a, E, F>(&'a self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&str, &'a Scope) -> Result<(), E>,
    {
        for (name, scope) in self.repository.iter() {
            scope.visit(&format!("repository.{name}"), f)?;
        }
        for (i, scope) in self.patterns.iter().enumerate() {
            scope.visit(&format!("patterns[{i}]"), f)?;
        }
        Ok(())
    }
}
