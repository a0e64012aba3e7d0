//! Spider discovery through the project's runner.
//!
//! The runner is launched as `<python> -m <runner> list` with `SCRAPY_PROJECT`
//! (and optionally `PYTHONPATH`) added to the inherited environment. Each line
//! of its standard output is one spider name.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::{Config, LauncherError, PROJECT_ENV, PYTHONPATH_ENV};

/// Message used when a failed listing printed nothing.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Cache key: project and module search path.
type CacheKey = (String, Option<String>);

/// Runs the listing command and caches results per project and search path.
#[derive(Debug)]
pub struct SpiderLister {
    python: String,
    runner: String,
    timeout: Duration,
    cache: Mutex<HashMap<CacheKey, Vec<String>>>,
}

impl SpiderLister {
    pub fn new(python: impl Into<String>, runner: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            runner: runner.into(),
            timeout: Duration::from_secs(crate::config::DEFAULT_LIST_TIMEOUT_SECS),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, LauncherError> {
        Ok(Self::new(config.python(), config.runner()).with_timeout(config.list_timeout()?))
    }

    /// Kill the listing command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// List the spiders of `project`.
    ///
    /// `runner` overrides the configured runner module; `pythonpath` is exported
    /// as `PYTHONPATH` when given.
    pub async fn list(
        &self,
        project: &str,
        runner: Option<&str>,
        pythonpath: Option<&str>,
    ) -> Result<Vec<String>, LauncherError> {
        let runner = runner.unwrap_or(&self.runner);

        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", runner, "list"])
            .env(PROJECT_ENV, project)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = pythonpath {
            cmd.env(PYTHONPATH_ENV, path);
        }

        tracing::debug!(project, runner, "Listing spiders");
        let start = Instant::now();
        let child = cmd.spawn()?;

        // On timeout the child is dropped with the future and killed.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_elapsed) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                tracing::warn!(project, elapsed_ms, "Spider listing timed out");
                return Err(LauncherError::Timeout {
                    project: project.to_string(),
                    elapsed_ms,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = failure_message(&stdout, &stderr);
            tracing::warn!(project, status = %output.status, "Spider listing failed: {}", message);
            return Err(LauncherError::SpiderList {
                project: project.to_string(),
                message,
            });
        }

        Ok(stdout.lines().map(str::to_string).collect())
    }

    /// List the spiders of `project`, reusing an earlier successful result.
    pub async fn cached(
        &self,
        project: &str,
        pythonpath: Option<&str>,
    ) -> Result<Vec<String>, LauncherError> {
        let key = (project.to_string(), pythonpath.map(str::to_string));
        if let Some(spiders) = self.lock_cache().get(&key) {
            return Ok(spiders.clone());
        }

        let spiders = self.list(project, None, pythonpath).await?;
        self.lock_cache().insert(key, spiders.clone());
        Ok(spiders)
    }

    /// Forget the cached spiders of `project` under every search path, e.g. after
    /// a new version is deployed.
    pub fn invalidate(&self, project: &str) {
        self.lock_cache().retain(|(cached, _), _| cached != project);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Vec<String>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pick the diagnostic for a failed listing: the last line of stderr, else the
/// last line of stdout, else [`UNKNOWN_ERROR`].
pub fn failure_message(stdout: &str, stderr: &str) -> String {
    [stderr, stdout]
        .into_iter()
        .find(|stream| !stream.is_empty())
        .and_then(|stream| stream.lines().last())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}
