//! Persistent per-project queue of pending job requests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use crawl_core::JobRequest;
use serde::{Deserialize, Serialize};
use ulid::Generator;

use crate::schema::{QUEUE_TABLE, init_schema};
use crate::{Database, DbError, QueueBackend, connect_queue};

/// Stored queue record.
///
/// The message is stored as JSON text so `null` members and integers above
/// `i64::MAX` come back exactly as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueEntry {
    key: String,
    priority: f64,
    message: String,
    enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    fn request(&self) -> Result<JobRequest, DbError> {
        Ok(serde_json::from_str(&self.message)?)
    }
}

#[derive(Deserialize)]
struct CountResult {
    count: i64,
}

const SELECT_ORDERED: &str = "SELECT key, priority, message, enqueued_at FROM spider_queue \
     ORDER BY priority DESC, key ASC";

/// A project's queue of pending job requests.
///
/// Entries come out highest priority first and, within a priority, in the
/// order they were added. Handles are cheap to clone and share one datastore.
#[derive(Clone)]
pub struct SpiderQueue {
    db: Database,
    path: PathBuf,
    backend: QueueBackend,
    keys: Arc<Mutex<Generator>>,
}

impl std::fmt::Debug for SpiderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpiderQueue")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .finish()
    }
}

impl SpiderQueue {
    /// Open the queue stored at `path`, creating it if absent.
    pub async fn open(path: impl AsRef<Path>, backend: QueueBackend) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        let db = connect_queue(&path, backend).await?;
        init_schema(&db).await?;

        tracing::debug!("Opened {} queue at {:?}", backend, path);

        Ok(Self {
            db,
            path,
            backend,
            keys: Arc::new(Mutex::new(Generator::new())),
        })
    }

    /// Location of the queue file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> QueueBackend {
        self.backend
    }

    /// Append a job request with the given priority.
    pub async fn add(&self, message: JobRequest, priority: f64) -> Result<(), DbError> {
        let key = self.next_key()?;
        let entry = QueueEntry {
            key: key.clone(),
            priority,
            message: serde_json::to_string(&message)?,
            enqueued_at: Utc::now(),
        };

        self.db
            .query("CREATE type::thing($table, $key) CONTENT $entry RETURN NONE")
            .bind(("table", QUEUE_TABLE))
            .bind(("key", key))
            .bind(("entry", entry))
            .await?
            .check()?;

        Ok(())
    }

    /// Remove and return the next job request, or `None` when empty.
    pub async fn pop(&self) -> Result<Option<JobRequest>, DbError> {
        loop {
            let mut result = self
                .db
                .query(format!("{SELECT_ORDERED} LIMIT 1"))
                .await?;
            let entries: Vec<QueueEntry> = result.take(0)?;

            let Some(entry) = entries.into_iter().next() else {
                return Ok(None);
            };

            // Another consumer may have taken it between the select and delete.
            if self.delete(&entry.key).await? {
                return entry.request().map(Some);
            }
        }
    }

    /// Number of pending job requests.
    pub async fn count(&self) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query("SELECT count() FROM spider_queue GROUP ALL")
            .await?;

        let counts: Vec<CountResult> = result.take(0)?;

        Ok(counts.first().map_or(0, |c| c.count.max(0) as u64))
    }

    /// Pending job requests in pop order.
    pub async fn list(&self) -> Result<Vec<JobRequest>, DbError> {
        self.entries()
            .await?
            .iter()
            .map(QueueEntry::request)
            .collect()
    }

    /// Remove every pending request matching `predicate`, returning how many were removed.
    pub async fn remove<F>(&self, predicate: F) -> Result<usize, DbError>
    where
        F: Fn(&JobRequest) -> bool,
    {
        let mut removed = 0;
        for entry in self.entries().await? {
            if predicate(&entry.request()?) && self.delete(&entry.key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove every pending request.
    pub async fn clear(&self) -> Result<(), DbError> {
        self.db.query("DELETE spider_queue").await?.check()?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<QueueEntry>, DbError> {
        let mut result = self.db.query(SELECT_ORDERED).await?;
        let entries: Vec<QueueEntry> = result.take(0)?;
        Ok(entries)
    }

    /// Delete one entry by key. Returns false when it was already gone.
    async fn delete(&self, key: &str) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("DELETE type::thing($table, $key) RETURN BEFORE")
            .bind(("table", QUEUE_TABLE))
            .bind(("key", key.to_string()))
            .await?;

        let removed: Vec<QueueEntry> = result.take(0)?;
        Ok(!removed.is_empty())
    }

    fn next_key(&self) -> Result<String, DbError> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.generate()
            .map(|ulid| ulid.to_string())
            .map_err(|e| DbError::Query(format!("Failed to allocate queue key: {}", e)))
    }
}
