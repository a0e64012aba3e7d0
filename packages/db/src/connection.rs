//! Datastore connections for per-project queue files.

use std::path::Path;
use std::str::FromStr;

use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use thiserror::Error;

/// Database connection wrapper.
pub type Database = Surreal<Any>;

/// Namespace shared by every queue datastore.
const NAMESPACE: &str = "scrapyd";
/// Database name inside each queue datastore.
const DATABASE: &str = "spider_queue";

/// Storage engine backing a queue file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueBackend {
    /// In-memory datastore; the path is ignored and nothing survives a restart.
    Memory,
    /// SurrealKV datastore at the queue path (requires the `surrealkv` feature).
    #[default]
    SurrealKv,
    /// RocksDB datastore at the queue path (requires the `rocksdb` feature).
    RocksDb,
}

impl QueueBackend {
    /// Connection endpoint for a queue stored at `path`.
    pub fn endpoint(&self, path: &Path) -> String {
        match self {
            QueueBackend::Memory => "mem://".to_string(),
            QueueBackend::SurrealKv => format!("surrealkv://{}", path.display()),
            QueueBackend::RocksDb => format!("rocksdb://{}", path.display()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueBackend::Memory => "memory",
            QueueBackend::SurrealKv => "surrealkv",
            QueueBackend::RocksDb => "rocksdb",
        }
    }
}

impl std::fmt::Display for QueueBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueBackend {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(QueueBackend::Memory),
            "surrealkv" => Ok(QueueBackend::SurrealKv),
            "rocksdb" => Ok(QueueBackend::RocksDb),
            other => Err(DbError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("unsupported queue backend '{0}' (expected memory|surrealkv|rocksdb)")]
    UnsupportedBackend(String),
    #[error("Connection error: {0}")]
    Connection(#[from] surrealdb::Error),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Open the datastore for a queue at `path` and select its namespace.
pub async fn connect_queue(path: &Path, backend: QueueBackend) -> Result<Database, DbError> {
    let endpoint = backend.endpoint(path);
    tracing::debug!("Connecting to queue store: {}", endpoint);

    let db = connect(endpoint).await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;

    Ok(db)
}
