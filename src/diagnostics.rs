use std::fmt;

/// How bad a diagnostic is.
///
/// Neither level aborts a run: a `Warning` means the output may differ from what the
/// author expects, an `Error` means some data was discarded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A `match`/`begin`/`end`/`while` value that Oniguruma refuses to compile.
    MalformedPattern { pattern: String, message: String },
    /// A field the classifier doesn't know about.
    UnrecognizedField,
    /// A known field holding a value of the wrong JSON type.
    UnexpectedValue { expected: &'static str },
    /// An `#name` include pointing nowhere in the local repository.
    DanglingInclude { target: String },
    /// A `begin`/`end`/`while` field, or its captures, whose pair was dropped.
    UnpairedDelimiter,
}

/// A single problem found while walking a grammar, with the location of the
/// offending field, eg `repository.string.patterns[2].match`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MalformedPattern { pattern, message } => write!(
                f,
                "{}: failed to parse pattern `{}`: {}; discarding",
                self.path, pattern, message
            ),
            DiagnosticKind::UnrecognizedField => {
                write!(f, "{}: unrecognized key; discarding", self.path)
            }
            DiagnosticKind::UnexpectedValue { expected } => {
                write!(f, "{}: expected {}; discarding", self.path, expected)
            }
            DiagnosticKind::DanglingInclude { target } => {
                write!(f, "{}: include '{}' has no repository entry", self.path, target)
            }
            DiagnosticKind::UnpairedDelimiter => {
                write!(f, "{}: no longer paired with a `begin`/`end`; discarding", self.path)
            }
        }
    }
}

/// Collects the diagnostics of one transformation run.
///
/// Every transformation takes its own collector so concurrent runs never interleave
/// their reports. Pushed diagnostics are also forwarded to the `log` facade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, path: impl Into<String>, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            severity,
            path: path.into(),
            kind,
        };
        match severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
        self.items.push(diagnostic);
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, kind: DiagnosticKind) {
        self.push(Severity::Warning, path, kind);
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, kind: DiagnosticKind) {
        self.push(Severity::Error, path, kind);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Whether any field was dropped during the run.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Appends the diagnostics of another run, keeping their order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
