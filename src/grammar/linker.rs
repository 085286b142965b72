//! Moves the repository of a grammar in and out of its own units.
//!
//! When decompiling, every repository entry becomes its own Rust module plus an index
//! re-exporting them all. When building, the entries are merged back into a single
//! `repository` map, in the order the grammar declares them.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, GrammarResult};
use crate::grammar::export::export_scope;
use crate::grammar::import::import_scope;
use crate::grammar::raw::RawRepository;
use crate::grammar::render::{render_repository_index, render_repository_unit, rust_ident};
use crate::grammar::structured::Repository;

/// Directory of the repository units, relative to the primary unit.
pub const REPOSITORY_DIR: &str = "repository";

/// A rendered source file, `path` being relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub source: String,
}

/// The unit of one repository entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUnit {
    /// Name of the entry in the grammar, as referenced by `#name` includes
    pub name: String,
    /// Name of the Rust function returning the entry
    pub ident: String,
    pub unit: SourceUnit,
}

/// Output of [`split_repository`]: one unit per entry and the index re-exporting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUnits {
    pub entries: Vec<RepositoryUnit>,
    pub index: SourceUnit,
}

impl RepositoryUnits {
    /// `(name, ident)` pairs in entry order, as expected by
    /// [`render_grammar`](crate::grammar::render::render_grammar).
    pub fn links(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.ident.clone()))
            .collect()
    }

    /// Every unit, entries first and the index last.
    pub fn into_units(self) -> Vec<SourceUnit> {
        let mut units: Vec<_> = self.entries.into_iter().map(|e| e.unit).collect();
        units.push(self.index);
        units
    }
}

/// Imports every entry of a JSON repository, failing on duplicate names.
pub fn import_repository(
    raw: &RawRepository,
    diagnostics: &mut Diagnostics,
) -> GrammarResult<Repository> {
    let mut repository = Repository::default();

    for (name, raw_scope) in raw.iter() {
        if repository.contains(name) {
            return Err(Error::RepositoryCollision(name.to_string()));
        }
        let scope = import_scope(raw_scope, &format!("repository.{name}"), diagnostics)?;
        repository.insert(name, scope)?;
        log::debug!("Processed repository entry '{name}'");
    }

    Ok(repository)
}

/// Inlines the repository entries back into a JSON map, keeping their order.
pub fn export_repository(repository: &Repository) -> RawRepository {
    RawRepository(
        repository
            .iter()
            .map(|(name, scope)| (name.to_string(), export_scope(scope)))
            .collect(),
    )
}

/// Renders one module per repository entry plus the index module.
///
/// Fails if two entry names map to the same Rust identifier, eg `string-double` and
/// `string_double`.
pub fn split_repository(repository: &Repository) -> GrammarResult<RepositoryUnits> {
    let dir = PathBuf::from(REPOSITORY_DIR);
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(repository.len());

    for (name, scope) in repository.iter() {
        let ident = rust_ident(name);
        if !seen.insert(ident.clone()) {
            return Err(Error::RepositoryCollision(name.to_string()));
        }
        entries.push(RepositoryUnit {
            name: name.to_string(),
            unit: SourceUnit {
                path: dir.join(format!("{ident}.rs")),
                source: render_repository_unit(&ident, scope),
            },
            ident,
        });
    }

    let index = SourceUnit {
        path: dir.join("mod.rs"),
        source: render_repository_index(entries.iter().map(|e| e.ident.as_str())),
    };

    Ok(RepositoryUnits { entries, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::pattern::Pattern;
    use crate::grammar::structured::Scope;

    fn numbered(n: usize) -> Repository {
        Repository::merge((0..n).map(|i| {
            (
                format!("rule{i}"),
                Scope {
                    match_: Some(Pattern::new(format!("x{{{i}}}")).into()),
                    ..Scope::default()
                },
            )
        }))
        .unwrap()
    }

    #[test]
    fn test_split_produces_one_unit_per_entry_and_an_index() {
        let repository = numbered(4);
        let units = split_repository(&repository).unwrap();

        assert_eq!(units.entries.len(), 4);
        assert_eq!(units.index.path, PathBuf::from("repository/mod.rs"));
        for entry in &units.entries {
            assert_eq!(entry.unit.path, PathBuf::from(format!("repository/{}.rs", entry.ident)));
            assert!(units.index.source.contains(&format!("mod {};", entry.ident)));
            assert!(units.index.source.contains(&format!("pub use {0}::{0};", entry.ident)));
        }
        assert_eq!(units.into_units().len(), 5);
    }

    #[test]
    fn test_merge_rebuilds_the_same_names() {
        let repository = numbered(3);
        let raw = export_repository(&repository);
        let names: Vec<_> = raw.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["rule0", "rule1", "rule2"]);

        let mut diagnostics = Diagnostics::new();
        let back = import_repository(&raw, &mut diagnostics).unwrap();
        assert_eq!(back, repository);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_json_names_are_a_collision() {
        let raw = RawRepository(vec![
            ("num".to_string(), serde_json::Map::new()),
            ("num".to_string(), serde_json::Map::new()),
        ]);
        let err = import_repository(&raw, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, Error::RepositoryCollision(name) if name == "num"));
    }

    #[test]
    fn test_identifier_clash_is_a_collision() {
        let repository = Repository::merge([
            ("string-double", Scope::default()),
            ("string_double", Scope::default()),
        ])
        .unwrap();
        let err = split_repository(&repository).unwrap_err();
        assert!(matches!(err, Error::RepositoryCollision(name) if name == "string_double"));
    }
}
