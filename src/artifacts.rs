//! Filesystem side of a run: clearing the output directory and writing artifacts.
//!
//! Independent artifacts are written as a parallel batch. The first failure stops
//! writes that have not started yet, and the error lists what happened to every target.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::{Error, GrammarResult};
use crate::grammar::linker::SourceUnit;

/// Removes `path` with everything in it and creates it again, empty.
pub fn clean(path: impl AsRef<Path>) -> GrammarResult<()> {
    let path = path.as_ref();
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(path, e)),
    }
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// What happened to a single target of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed(String),
    /// Not attempted because another write of the batch had already failed
    Cancelled,
}

/// Every target of a failed batch with its outcome, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub outcomes: Vec<(PathBuf, Outcome)>,
}

impl BatchFailure {
    pub fn failed(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.outcomes.iter().filter_map(|(path, outcome)| match outcome {
            Outcome::Failed(message) => Some((path.as_path(), message.as_str())),
            _ => None,
        })
    }

    fn count(&self, wanted: fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| wanted(o)).count()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} writes failed ({} done, {} cancelled)",
            self.count(|o| matches!(o, Outcome::Failed(_))),
            self.outcomes.len(),
            self.count(|o| matches!(o, Outcome::Done)),
            self.count(|o| matches!(o, Outcome::Cancelled)),
        )?;
        for (path, message) in self.failed() {
            write!(f, "\n  {}: {}", path.display(), message)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Job {
    Write { target: PathBuf, contents: String },
    Copy { source: PathBuf, target: PathBuf },
}

impl Job {
    fn target(&self) -> &Path {
        match self {
            Job::Write { target, .. } | Job::Copy { target, .. } => target,
        }
    }

    fn run(&self) -> io::Result<()> {
        match self {
            Job::Write { target, contents } => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(target, contents)
            }
            Job::Copy { source, target } => fs::copy(source, target).map(|_| ()),
        }
    }
}

fn run_batch(jobs: Vec<Job>) -> GrammarResult<Vec<PathBuf>> {
    let failed = AtomicBool::new(false);

    let outcomes: Vec<(PathBuf, Outcome)> = jobs
        .par_iter()
        .map(|job| {
            let target = job.target().to_path_buf();
            if failed.load(Ordering::Relaxed) {
                return (target, Outcome::Cancelled);
            }
            match job.run() {
                Ok(()) => {
                    log::info!("Wrote '{}'", target.display());
                    (target, Outcome::Done)
                }
                Err(e) => {
                    failed.store(true, Ordering::Relaxed);
                    (target, Outcome::Failed(e.to_string()))
                }
            }
        })
        .collect();

    if failed.load(Ordering::Relaxed) {
        return Err(BatchFailure { outcomes }.into());
    }
    Ok(outcomes.into_iter().map(|(path, _)| path).collect())
}

/// Writes rendered units under `out_dir`, creating subdirectories as needed.
pub fn write_units(out_dir: &Path, units: &[SourceUnit]) -> GrammarResult<Vec<PathBuf>> {
    run_batch(
        units
            .iter()
            .map(|unit| Job::Write {
                target: out_dir.join(&unit.path),
                contents: unit.source.clone(),
            })
            .collect(),
    )
}

/// Copies every `*.json` file of `src_dir` into `out_dir`.
pub fn copy_configs(src_dir: &Path, out_dir: &Path) -> GrammarResult<Vec<PathBuf>> {
    let mut jobs = Vec::new();
    for entry in fs::read_dir(src_dir).map_err(|e| Error::io(src_dir, e))? {
        let path = entry.map_err(|e| Error::io(src_dir, e))?.path();
        if path.is_file() && path.extension() == Some("json".as_ref()) {
            if let Some(file_name) = path.file_name() {
                jobs.push(Job::Copy {
                    target: out_dir.join(file_name),
                    source: path,
                });
            }
        }
    }
    // read_dir order is platform dependent
    jobs.sort_by(|a, b| a.target().cmp(b.target()));

    run_batch(jobs)
}
