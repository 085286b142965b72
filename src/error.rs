use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::artifacts::BatchFailure;

pub(crate) type GrammarResult<T> = Result<T, Error>;

/// Errors that abort a conversion run.
///
/// Per-node problems (a pattern that does not compile, a field we don't know about) are
/// not errors: they end up in [`Diagnostics`](crate::Diagnostics) and the run continues.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred when reading a grammar, writing an artifact or clearing
    /// an output directory.
    Io { path: PathBuf, source: io::Error },

    /// JSON parsing failed when loading a grammar document.
    Json(serde_json::Error),

    /// Two repository entries share a name, or two names end up as the same
    /// Rust identifier once rendered.
    RepositoryCollision(String),

    /// A captures key is not a base-10 integer.
    #[allow(missing_docs)]
    CapturesKey { path: String, key: String },

    /// A rule has an invalid shape, eg `match` and `begin` on the same node
    /// or a `begin` without its `end`.
    #[allow(missing_docs)]
    InvalidRule { path: String, reason: String },

    /// The formatting service failed or could not be started.
    Format(String),

    /// At least one write of a batch failed.
    BatchWrite(BatchFailure),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, source } => write!(f, "I/O error on '{}': {}", path.display(), source),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
            Error::RepositoryCollision(name) => {
                write!(f, "repository entry '{}' is defined more than once", name)
            }
            Error::CapturesKey { path, key } => {
                write!(f, "captures key '{}' at {} is not an integer", key, path)
            }
            Error::InvalidRule { path, reason } => write!(f, "invalid rule at {}: {}", path, reason),
            Error::Format(message) => write!(f, "formatting failed: {}", message),
            Error::BatchWrite(failure) => write!(f, "{}", failure),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Json(err) => Some(err),
            Error::RepositoryCollision(_)
            | Error::CapturesKey { .. }
            | Error::InvalidRule { .. }
            | Error::Format(_)
            | Error::BatchWrite(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<BatchFailure> for Error {
    fn from(failure: BatchFailure) -> Self {
        Error::BatchWrite(failure)
    }
}
