//! Queue registry and job launching for the crawl service.
//!
//! # Architecture
//!
//! - `QueueRegistry` - One persistent queue per known project
//! - `project_list` - Projects from the packages directory and `[settings]`
//! - `SpiderLister` - Spider names from the project's runner
//! - `LaunchCommand` - The crawl invocation for a dequeued job
//!
//! # Usage
//!
//! ```ignore
//! use launcher::{Config, QueueRegistry, RunDir};
//!
//! let config = Config::load()?;
//! let registry = QueueRegistry::open(&config, &RunDir::from_process_args()?).await?;
//! ```

pub mod config;
mod error;
mod launch;
mod projects;
pub mod registry;
mod rundir;
mod spiders;

pub use config::Config;
pub use error::LauncherError;
pub use launch::LaunchCommand;
pub use projects::project_list;
pub use registry::{QueueRegistry, queue_path};
pub use rundir::RunDir;
pub use spiders::{SpiderLister, UNKNOWN_ERROR, failure_message};

/// Environment variable naming the project for the runner.
pub const PROJECT_ENV: &str = "SCRAPY_PROJECT";
/// Environment variable carrying the job identifier to a crawl.
pub const JOB_ENV: &str = "SCRAPY_JOB";
/// Environment variable extending the runner's module search path.
pub const PYTHONPATH_ENV: &str = "PYTHONPATH";
