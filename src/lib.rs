//! Converts TextMate grammars between their JSON form and typed Rust definitions.
//!
//! Decompiling turns a `*.tmLanguage.json` file into Rust modules building a [`Grammar`],
//! one module per repository entry. Building goes the other way: a [`Grammar`] written in
//! Rust is exported back to a JSON grammar.

mod artifacts;
mod diagnostics;
mod error;
mod format;
pub mod grammar;
mod pipeline;

pub use artifacts::{BatchFailure, Outcome, clean};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::Error;
pub use format::{FormatStyle, Formatter, Rustfmt, Verbatim};
pub use grammar::{
    Captures, ExtraValue, Grammar, Pattern, PatternFlags, PatternValue, RawGrammar, Repository,
    Scope, export_grammar, import_grammar,
};
pub use pipeline::{
    BuildOptions, BuildReport, DecompileOptions, DecompileReport, PRIMARY_UNIT, build, decompile,
    render_units,
};
