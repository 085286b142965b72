use std::fmt;
use std::sync::{Arc, OnceLock};

/// Oniguruma options that can be turned on for a whole pattern.
///
/// In a JSON grammar they are written as a leading inline option group, eg `(?ix)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternFlags {
    pub ignore_case: bool,
    /// `m` in Oniguruma's Ruby syntax: `.` also matches newlines
    pub multiline: bool,
    pub extended: bool,
}

impl PatternFlags {
    pub fn is_empty(self) -> bool {
        !(self.ignore_case || self.multiline || self.extended)
    }

    /// Splits a leading `(?imx)` group off `text`.
    ///
    /// Only a group written in canonical form is taken so that the text can be rebuilt
    /// byte for byte; anything else stays part of the pattern source.
    fn split_prefix(text: &str) -> (PatternFlags, &str) {
        let Some(rest) = text.strip_prefix("(?") else {
            return (PatternFlags::default(), text);
        };
        let Some(end) = rest.find(')') else {
            return (PatternFlags::default(), text);
        };
        let letters = &rest[..end];
        let flags = PatternFlags {
            ignore_case: letters.contains('i'),
            multiline: letters.contains('m'),
            extended: letters.contains('x'),
        };
        if flags.is_empty() || flags.to_string() != letters {
            return (PatternFlags::default(), text);
        }
        (flags, &rest[end + 1..])
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_case {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.extended {
            f.write_str("x")?;
        }
        Ok(())
    }
}

/// A regular expression of a rule: source text and flags, compiled lazily with Oniguruma.
pub struct Pattern {
    source: String,
    flags: PatternFlags,
    compiled: OnceLock<Option<Arc<onig::Regex>>>,
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        // Same source, fresh lazy compilation
        Self {
            source: self.source.clone(),
            flags: self.flags,
            compiled: OnceLock::new(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl Pattern {
    /// Creates a pattern without compiling it.
    ///
    /// A leading `(?imx)` group is moved into the flags, so `Pattern::new("(?i)abc")`
    /// has source `abc` and the `i` flag.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (flags, source) = PatternFlags::split_prefix(&text);
        let source = if flags.is_empty() {
            text
        } else {
            source.to_string()
        };

        Self {
            source,
            flags,
            compiled: OnceLock::new(),
        }
    }

    /// Creates a pattern and makes sure Oniguruma accepts it.
    pub fn parse(text: &str) -> Result<Self, onig::Error> {
        let pattern = Self::new(text);
        pattern.validate()?;
        Ok(pattern)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn with_flags(mut self, flags: PatternFlags) -> Self {
        self.flags = flags;
        self.compiled = OnceLock::new();
        self
    }

    /// The pattern as written in a JSON grammar: flags group first, then the source.
    pub fn to_text(&self) -> String {
        if self.flags.is_empty() {
            self.source.clone()
        } else {
            format!("(?{}){}", self.flags, self.source)
        }
    }

    /// Whether the source refers to captures of another pattern, eg `\1` in an `end`
    /// pointing back at its `begin`.
    pub fn has_backreferences(&self) -> bool {
        (1..=9).any(|i| self.source.contains(&format!("\\{i}")))
    }

    /// `None` if Oniguruma rejects the pattern, which includes patterns with
    /// backreferences compiled on their own.
    pub fn compiled(&self) -> Option<&Arc<onig::Regex>> {
        self.compiled
            .get_or_init(|| onig::Regex::new(&self.to_text()).ok().map(Arc::new))
            .as_ref()
    }

    /// Validate that this pattern compiles successfully
    pub fn validate(&self) -> Result<(), onig::Error> {
        onig::Regex::new(&self.to_text()).map(|_| ())
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::new(text)
    }
}

/// The value of a pattern field.
///
/// Authors normally write a [`Pattern`]; `Text` is an escape hatch for strings that must
/// reach the JSON output untouched, eg patterns relying on runtime substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternValue {
    Compiled(Pattern),
    Text(String),
}

impl PatternValue {
    pub fn to_text(&self) -> String {
        match self {
            PatternValue::Compiled(pattern) => pattern.to_text(),
            PatternValue::Text(text) => text.clone(),
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            PatternValue::Compiled(pattern) => Some(pattern),
            PatternValue::Text(_) => None,
        }
    }
}

impl From<Pattern> for PatternValue {
    fn from(pattern: Pattern) -> Self {
        PatternValue::Compiled(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_pattern_keeps_its_source() {
        let pattern = Pattern::parse("a+").unwrap();
        assert_eq!(pattern.source(), "a+");
        assert!(pattern.flags().is_empty());
        assert_eq!(pattern.to_text(), "a+");
    }

    #[test]
    fn test_flags_prefix_moves_into_flags() {
        let pattern = Pattern::new("(?ix)\\b foo \\b");
        assert_eq!(pattern.source(), "\\b foo \\b");
        assert!(pattern.flags().ignore_case);
        assert!(pattern.flags().extended);
        assert!(!pattern.flags().multiline);
        assert_eq!(pattern.to_text(), "(?ix)\\b foo \\b");
    }

    #[test]
    fn test_non_canonical_prefix_stays_in_source() {
        for text in ["(?xi)a", "(?ii)a", "(?i:a)", "(?=a)", "(?)a", "(?i"] {
            let pattern = Pattern::new(text);
            assert_eq!(pattern.source(), text);
            assert!(pattern.flags().is_empty());
            assert_eq!(pattern.to_text(), text);
        }
    }

    #[test]
    fn test_malformed_pattern_is_rejected() {
        assert!(Pattern::parse("(unclosed").is_err());
        assert!(Pattern::parse("[a-").is_err());
    }

    #[test]
    fn test_compiled_pattern_matches() {
        let pattern = Pattern::new("(?i)select");
        let regex = pattern.compiled().unwrap();
        assert!(regex.find("SELECT *").is_some());
    }

    #[test]
    fn test_backreferences_are_detected() {
        assert!(Pattern::new("^\\2$").has_backreferences());
        assert!(Pattern::new("</\\1>").has_backreferences());
        assert!(!Pattern::new("\\b\\w+").has_backreferences());
        assert!(!Pattern::new("x{10}").has_backreferences());
        // no `begin` to refer to on its own
        assert!(Pattern::new("^\\2$").compiled().is_none());
    }

    #[test]
    fn test_equality_ignores_compilation_state() {
        let a = Pattern::new("[0-9]+");
        let b = a.clone();
        assert!(a.compiled().is_some());
        assert_eq!(a, b);
        assert_ne!(a, Pattern::new("[0-9]+").with_flags(PatternFlags {
            ignore_case: true,
            ..PatternFlags::default()
        }));
    }
}
