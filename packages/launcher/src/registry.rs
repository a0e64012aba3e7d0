//! Registry of per-project job queues.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crawl_core::JobRequest;
use db::{QueueBackend, SpiderQueue};
use tokio::fs;

use crate::projects::project_list;
use crate::{Config, LauncherError, RunDir};

/// Extension of queue files inside the storage directory.
pub const QUEUE_EXTENSION: &str = "db";

/// Path of the queue file for `project`.
pub fn queue_path(dbs_dir: &Path, project: &str) -> PathBuf {
    dbs_dir.join(format!("{}.{}", project, QUEUE_EXTENSION))
}

/// One open queue per known project.
///
/// Opening is all-or-nothing: when any project's queue fails to open, the
/// queues already opened by that call are dropped and the error is returned.
#[derive(Debug)]
pub struct QueueRegistry {
    dbs_dir: PathBuf,
    backend: QueueBackend,
    queues: HashMap<String, SpiderQueue>,
}

impl QueueRegistry {
    /// Open a queue for every project found by [`project_list`].
    ///
    /// The storage directory is created first if missing.
    pub async fn open(config: &Config, run_dir: &RunDir) -> Result<Self, LauncherError> {
        let dbs_dir = run_dir.resolve(config.dbs_dir());
        let backend = config.queue_backend()?;

        fs::create_dir_all(&dbs_dir).await?;

        let projects = project_list(config, run_dir).await?;
        let queues = open_queues(&dbs_dir, backend, &projects, &HashMap::new()).await?;

        tracing::info!(
            "Opened {} project queue(s) in {:?} ({})",
            queues.len(),
            dbs_dir,
            backend
        );

        Ok(Self {
            dbs_dir,
            backend,
            queues,
        })
    }

    /// Open queues for projects that appeared since the registry was built.
    ///
    /// Returns the newly added project names, sorted. Existing queues are kept.
    pub async fn refresh(
        &mut self,
        config: &Config,
        run_dir: &RunDir,
    ) -> Result<Vec<String>, LauncherError> {
        fs::create_dir_all(&self.dbs_dir).await?;

        let projects = project_list(config, run_dir).await?;
        let opened = open_queues(&self.dbs_dir, self.backend, &projects, &self.queues).await?;

        let mut added: Vec<String> = opened.keys().cloned().collect();
        added.sort();
        if !added.is_empty() {
            tracing::info!("Opened queues for new projects: {}", added.join(", "));
        }

        self.queues.extend(opened);
        Ok(added)
    }

    /// The queue for `project`, if known.
    pub fn get(&self, project: &str) -> Option<&SpiderQueue> {
        self.queues.get(project)
    }

    /// The queue for `project`, or [`LauncherError::UnknownProject`].
    pub fn queue(&self, project: &str) -> Result<&SpiderQueue, LauncherError> {
        self.get(project)
            .ok_or_else(|| LauncherError::UnknownProject(project.to_string()))
    }

    /// Add `request` to its project's queue.
    ///
    /// Requests that do not yield crawl arguments are refused.
    pub async fn enqueue(&self, request: JobRequest, priority: f64) -> Result<(), LauncherError> {
        let queue = self.queue(request.project()?)?;
        request.crawl_args()?;
        queue.add(request, priority).await?;
        Ok(())
    }

    /// Registered project names, sorted.
    pub fn projects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queues.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn dbs_dir(&self) -> &Path {
        &self.dbs_dir
    }

    /// Pending job counts per project, sorted by project.
    pub async fn pending_counts(&self) -> Result<Vec<(String, u64)>, LauncherError> {
        let mut counts = Vec::with_capacity(self.queues.len());
        for project in self.projects() {
            let count = self.queue(project)?.count().await?;
            counts.push((project.to_string(), count));
        }
        Ok(counts)
    }
}

async fn open_queues(
    dbs_dir: &Path,
    backend: QueueBackend,
    projects: &[String],
    existing: &HashMap<String, SpiderQueue>,
) -> Result<HashMap<String, SpiderQueue>, LauncherError> {
    let mut opened = HashMap::new();

    for project in projects {
        if existing.contains_key(project) || opened.contains_key(project) {
            continue;
        }

        let path = queue_path(dbs_dir, project);
        let queue = SpiderQueue::open(&path, backend)
            .await
            .map_err(|source| LauncherError::QueueOpen {
                project: project.clone(),
                source,
            })?;

        opened.insert(project.clone(), queue);
    }

    Ok(opened)
}
