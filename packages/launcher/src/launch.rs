//! The crawl process invocation for a dequeued job.

use crawl_core::JobRequest;
use tokio::process::Command;

use crate::{Config, JOB_ENV, LauncherError, PROJECT_ENV};

/// Program, arguments and extra environment for one crawl.
///
/// The environment entries are added on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    /// Build `<python> -m <runner> crawl <crawl args>` for `request`.
    pub fn for_request(config: &Config, request: &JobRequest) -> Result<Self, LauncherError> {
        let project = request.project()?;

        let mut args = vec!["-m".to_string(), config.runner(), "crawl".to_string()];
        args.extend(request.crawl_args()?);

        let mut env = vec![(PROJECT_ENV.to_string(), project.to_string())];
        if let Some(job) = request.job_id() {
            env.push((JOB_ENV.to_string(), job.to_string()));
        }

        tracing::debug!(project, "Built launch command with {} argument(s)", args.len());

        Ok(Self {
            program: config.python(),
            args,
            env,
        })
    }

    /// A command ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl std::fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
