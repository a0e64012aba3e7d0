//! Launcher errors.

use std::path::PathBuf;

use crawl_core::CoreError;
use db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file {0:?} does not exist")]
    MissingConfig(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid job request: {0}")]
    Job(#[from] CoreError),

    #[error("queue store error: {0}")]
    Db(#[from] DbError),

    #[error("failed to open queue for project '{project}': {source}")]
    QueueOpen { project: String, source: DbError },

    #[error("no queue for project '{0}'")]
    UnknownProject(String),

    /// The listing command exited unsuccessfully. The message is its most
    /// specific diagnostic line.
    #[error("{message}")]
    SpiderList { project: String, message: String },

    #[error("spider listing for project '{project}' timed out after {elapsed_ms}ms")]
    Timeout { project: String, elapsed_ms: u64 },
}
