use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{Error, GrammarResult};

/// Canonicalizes the layout of generated Rust source.
pub trait Formatter: Sync {
    fn format(&self, source: &str) -> GrammarResult<String>;
}

/// Returns the source as rendered.
#[derive(Debug, Copy, Clone, Default)]
pub struct Verbatim;

impl Formatter for Verbatim {
    fn format(&self, source: &str) -> GrammarResult<String> {
        Ok(source.to_string())
    }
}

/// Layout settings passed to `rustfmt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FormatStyle {
    pub edition: String,
    pub tab_spaces: usize,
    pub hard_tabs: bool,
    pub max_width: usize,
}

impl Default for FormatStyle {
    fn default() -> Self {
        Self {
            edition: "2024".to_string(),
            tab_spaces: 4,
            hard_tabs: false,
            max_width: 100,
        }
    }
}

impl FormatStyle {
    /// Reads a JSON style file, eg `{"tab_spaces": 2}`. Missing keys keep their default.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GrammarResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn config_arg(&self) -> String {
        format!(
            "tab_spaces={},hard_tabs={},max_width={}",
            self.tab_spaces, self.hard_tabs, self.max_width
        )
    }
}

/// Formats source by piping it through a `rustfmt` binary.
#[derive(Debug, Clone)]
pub struct Rustfmt {
    program: String,
    style: FormatStyle,
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self {
            program: "rustfmt".to_string(),
            style: FormatStyle::default(),
        }
    }
}

impl Rustfmt {
    pub fn new(style: FormatStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Uses another binary than the `rustfmt` found in `PATH`.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Formatter for Rustfmt {
    fn format(&self, source: &str) -> GrammarResult<String> {
        let mut child = Command::new(&self.program)
            .args(["--emit", "stdout", "--quiet", "--edition", &self.style.edition])
            .arg("--config")
            .arg(self.style.config_arg())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Format(format!("cannot run '{}': {}", self.program, e)))?;

        // Dropping stdin closes it so rustfmt sees the end of the input
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| Error::Format(format!("cannot write to '{}': {}", self.program, e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Format(format!("'{}' did not finish: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Format(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| Error::Format(format!("'{}' output was not valid UTF-8", self.program)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim_is_identity() {
        let source = "pub fn num() -> Scope {\n    Scope::default()\n}\n";
        assert_eq!(Verbatim.format(source).unwrap(), source);
    }

    #[test]
    fn test_style_defaults_and_partial_config() {
        let style: FormatStyle = serde_json::from_str(r#"{"tab_spaces": 2}"#).unwrap();
        assert_eq!(style.tab_spaces, 2);
        assert_eq!(style.edition, "2024");
        assert_eq!(style.config_arg(), "tab_spaces=2,hard_tabs=false,max_width=100");
    }

    #[test]
    fn test_style_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.json");
        std::fs::write(&path, r#"{"hard_tabs": true, "max_width": 80}"#).unwrap();

        let style = FormatStyle::load_from_file(&path).unwrap();
        assert_eq!(
            style,
            FormatStyle {
                hard_tabs: true,
                max_width: 80,
                ..FormatStyle::default()
            }
        );

        let err = FormatStyle::load_from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_missing_binary_is_a_format_error() {
        let rustfmt = Rustfmt::default().program("definitely-not-a-rustfmt-binary");
        let err = rustfmt.format("fn main() {}").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
