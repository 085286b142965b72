mod export;
mod import;
mod kind;
pub mod linker;
mod pattern;
mod raw;
pub mod render;
mod structured;

pub use export::{export_grammar, export_scope};
pub use import::{import_grammar, import_scope};
pub use kind::{Field, FieldKind, classify};
pub use pattern::{Pattern, PatternFlags, PatternValue};
pub use raw::{RawGrammar, RawRepository, RawScope};
pub use structured::{Captures, ExtraValue, FieldRef, Grammar, Repository, Scope};
