//! The directory relative paths are resolved against.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crawl_core::find_rundir;

/// Root for the relative `dbs_dir` and `eggs_dir` paths.
///
/// The run directory is passed explicitly instead of changing the process
/// working directory, so resolving it has no process-wide side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir(PathBuf);

impl RunDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The current working directory.
    pub fn current() -> io::Result<Self> {
        Ok(Self(std::env::current_dir()?))
    }

    /// Use `dir` when given, anchoring a relative path at the current
    /// directory; otherwise use the current directory.
    pub fn from_override(dir: Option<PathBuf>) -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self(match dir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        }))
    }

    /// Resolve from a `--rundir <path>` pair in `args`.
    pub fn from_args<I, S>(args: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self::from_override(find_rundir(args))
    }

    /// Use `dir` when given, otherwise look for `--rundir` in `args`.
    pub fn from_override_or_args<I, S>(dir: Option<PathBuf>, args: I) -> io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        match dir {
            Some(dir) => Self::from_override(Some(dir)),
            None => Self::from_args(args),
        }
    }

    /// Resolve from this process's command-line arguments.
    pub fn from_process_args() -> io::Result<Self> {
        Self::from_args(std::env::args_os())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Join `path` onto the run directory. Absolute paths are returned as-is.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.0.join(path)
    }
}
