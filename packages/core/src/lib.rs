//! Core types for launching crawl jobs.
//!
//! This crate contains the pure pieces shared by the launcher:
//! - JobRequest and JobId for submitted work
//! - Crawl argument construction for the spawned process
//! - Run directory lookup from process arguments

mod crawl_args;
mod job;
mod rundir;

pub use crawl_args::{ARG_FLAG, SETTING_FLAG, coerce_arg, crawl_args};
pub use job::{JOB_KEY, JobId, JobRequest, PROJECT_KEY, RESERVED_KEYS, SETTINGS_KEY, SPIDER_KEY};
pub use rundir::{RUNDIR_FLAG, find_rundir};

/// Errors raised while interpreting a job request.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("job request is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("job request key '{0}' must be a string")]
    InvalidField(&'static str),

    #[error("job request 'settings' must be a mapping")]
    InvalidSettings,

    #[error("'{0}' is reserved and cannot be passed as a spider argument")]
    ReservedKey(String),
}
