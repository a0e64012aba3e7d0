//! Queue schema definitions using SurrealQL.

use crate::{Database, DbError};

/// Table holding pending job requests.
pub(crate) const QUEUE_TABLE: &str = "spider_queue";

/// Initialize the queue schema on a freshly connected datastore.
pub async fn init_schema(db: &Database) -> Result<(), DbError> {
    db.query(QUEUE_SCHEMA).await?.check()?;
    Ok(())
}

/// Queue table schema.
const QUEUE_SCHEMA: &str = r#"
-- Pending job requests, popped by priority then insertion order
DEFINE TABLE IF NOT EXISTS spider_queue SCHEMALESS;

DEFINE FIELD IF NOT EXISTS key ON spider_queue TYPE string;
DEFINE FIELD IF NOT EXISTS priority ON spider_queue TYPE float DEFAULT 0.0;
DEFINE FIELD IF NOT EXISTS message ON spider_queue TYPE string;

DEFINE INDEX IF NOT EXISTS spider_queue_key ON spider_queue FIELDS key UNIQUE;
DEFINE INDEX IF NOT EXISTS spider_queue_order ON spider_queue FIELDS priority, key;
"#;
