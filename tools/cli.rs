use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tmgrammar::{
    BuildOptions, DecompileOptions, Diagnostics, Error, FormatStyle, RawGrammar, Rustfmt,
    Verbatim, build, decompile, import_grammar,
};

#[derive(Debug, Parser)]
#[command(name = "tmgrammar", version, about = "Convert TextMate grammars to and from Rust")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Turn a JSON grammar into Rust modules, one per repository entry
    Decompile {
        /// Path to a `*.tmLanguage.json` file
        path: PathBuf,
        /// Output directory, cleared before writing
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Write the generated code without running rustfmt on it
        #[arg(long)]
        no_format: bool,
        /// rustfmt binary to use
        #[arg(long, value_name = "PROGRAM")]
        rustfmt: Option<String>,
        /// JSON file with rustfmt settings: `edition`, `tab_spaces`, `hard_tabs`, `max_width`
        #[arg(long, value_name = "FILE")]
        style: Option<PathBuf>,
        /// Warn about `#name` includes with no repository entry
        #[arg(long)]
        check_includes: bool,
    },
    /// Import a JSON grammar and write it back, dropping what cannot be represented
    Normalize {
        /// Path to a `*.tmLanguage.json` file
        path: PathBuf,
        /// Output directory, cleared before writing
        #[arg(long, default_value = "dist")]
        out: PathBuf,
        /// Base name of the output file, defaults to the grammar name
        #[arg(long)]
        name: Option<String>,
        /// Copy the `*.json` files of this directory next to the grammar
        #[arg(long, value_name = "DIR")]
        config_dir: Option<PathBuf>,
    },
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        eprintln!("{:?}: {}", diagnostic.severity, diagnostic);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Command::Decompile {
            path,
            out,
            no_format,
            rustfmt,
            style,
            check_includes,
        } => {
            let options = DecompileOptions::new(out).check_includes(check_includes);
            let options = if no_format {
                options.formatter(Verbatim)
            } else {
                let style = match style {
                    Some(path) => FormatStyle::load_from_file(path)?,
                    None => FormatStyle::default(),
                };
                let formatter = Rustfmt::new(style);
                match rustfmt {
                    Some(program) => options.formatter(formatter.program(program)),
                    None => options.formatter(formatter),
                }
            };

            let report = decompile(&path, &options)?;
            print_diagnostics(&report.diagnostics);
            println!(
                "✓ Decompiled '{}' into {} files",
                report.grammar_name,
                report.written.len()
            );
        }
        Command::Normalize {
            path,
            out,
            name,
            config_dir,
        } => {
            let raw = RawGrammar::load_from_file(&path)?;
            let mut diagnostics = Diagnostics::new();
            let grammar = import_grammar(&raw, &mut diagnostics)?;
            print_diagnostics(&diagnostics);

            let mut options = BuildOptions::new(out);
            if let Some(name) = name {
                options = options.name(name);
            }
            if let Some(dir) = config_dir {
                options = options.config_dir(dir);
            }

            let report = build(&grammar, &options)?;
            println!("✓ Wrote '{}'", report.grammar.display());
            for copied in &report.copied {
                println!("✓ Copied '{}'", copied.display());
            }
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("✗ {e}");
        process::exit(1);
    }
}
