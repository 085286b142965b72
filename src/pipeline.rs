use std::fs;
use std::path::{Path, PathBuf};

use crate::artifacts::{clean, copy_configs, write_units};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, GrammarResult};
use crate::format::{Formatter, Rustfmt};
use crate::grammar::linker::{SourceUnit, split_repository};
use crate::grammar::render::render_grammar;
use crate::grammar::{Grammar, RawGrammar, export_grammar, import_grammar};

/// File name of the primary unit written by [`decompile`].
pub const PRIMARY_UNIT: &str = "mod.rs";

/// Options for [`decompile`].
pub struct DecompileOptions {
    pub(crate) out_dir: PathBuf,
    pub(crate) formatter: Box<dyn Formatter>,
    pub(crate) check_includes: bool,
}

impl DecompileOptions {
    /// Writes into `out_dir`, formatting with `rustfmt` from `PATH`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            formatter: Box::new(Rustfmt::default()),
            check_includes: false,
        }
    }

    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Also reports `#name` includes with no repository entry.
    pub fn check_includes(mut self, value: bool) -> Self {
        self.check_includes = value;
        self
    }
}

/// What a [`decompile`] run produced.
#[derive(Debug, Clone)]
pub struct DecompileReport {
    pub grammar_name: String,
    pub written: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// Renders a JSON grammar as formatted Rust source units, without touching the disk.
///
/// The primary unit comes first, followed by one unit per repository entry and the
/// repository index.
pub fn render_units(
    raw: &RawGrammar,
    formatter: &dyn Formatter,
    check_includes: bool,
    diagnostics: &mut Diagnostics,
) -> GrammarResult<Vec<SourceUnit>> {
    let grammar = import_grammar(raw, diagnostics)?;
    grammar.validate()?;
    if check_includes {
        grammar.dangling_includes(diagnostics);
    }

    let repository = split_repository(&grammar.repository)?;
    let primary = SourceUnit {
        path: PathBuf::from(PRIMARY_UNIT),
        source: render_grammar(&grammar, &repository.links()),
    };

    let mut units = vec![primary];
    if !grammar.repository.is_empty() {
        units.extend(repository.into_units());
    }

    for unit in &mut units {
        unit.source = formatter.format(&unit.source)?;
    }
    Ok(units)
}

/// Turns the JSON grammar at `path` into Rust modules under the output directory.
///
/// The output directory is cleared first. Dropped fields are reported in the returned
/// diagnostics; anything else going wrong aborts the run.
pub fn decompile(path: impl AsRef<Path>, options: &DecompileOptions) -> GrammarResult<DecompileReport> {
    let raw = RawGrammar::load_from_file(path.as_ref())?;
    log::info!("Parsed grammar for '{}'", raw.name);

    let mut diagnostics = Diagnostics::new();
    let units = render_units(
        &raw,
        options.formatter.as_ref(),
        options.check_includes,
        &mut diagnostics,
    )?;

    clean(&options.out_dir)?;
    let written = write_units(&options.out_dir, &units)?;

    Ok(DecompileReport {
        grammar_name: raw.name,
        written,
        diagnostics,
    })
}

/// Options for [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub(crate) out_dir: PathBuf,
    pub(crate) name: Option<String>,
    pub(crate) config_dir: Option<PathBuf>,
}

impl BuildOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            name: None,
            config_dir: None,
        }
    }

    /// Base name of the output file, `<name>.tmLanguage.json`.
    /// Defaults to the grammar name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Directory whose `*.json` files are copied next to the grammar,
    /// eg `language-configuration.json`.
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }
}

/// What a [`build`] run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub grammar: PathBuf,
    pub copied: Vec<PathBuf>,
}

/// Writes `grammar` as a JSON grammar in the output directory, clearing it first.
pub fn build(grammar: &Grammar, options: &BuildOptions) -> GrammarResult<BuildReport> {
    grammar.validate()?;
    let json = export_grammar(grammar).to_json()?;

    let name = options.name.as_deref().unwrap_or(&grammar.name);
    let target = options.out_dir.join(format!("{name}.tmLanguage.json"));

    clean(&options.out_dir)?;
    fs::write(&target, json).map_err(|e| Error::io(&target, e))?;
    log::info!("Wrote file '{}'", target.display());

    let copied = match &options.config_dir {
        Some(dir) => copy_configs(dir, &options.out_dir)?,
        None => Vec::new(),
    };

    Ok(BuildReport {
        grammar: target,
        copied,
    })
}
