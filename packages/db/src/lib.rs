//! SurrealDB-backed job queues for the crawl launcher.
//!
//! Each project owns one datastore at `<dbs_dir>/<project>.db` holding its
//! pending job requests.
//!
//! # Features
//!
//! - `surrealkv` (default): Persist queues with SurrealKV
//! - `rocksdb`: Persist queues with RocksDB
//!
//! The in-memory backend is always available for tests.

mod connection;
mod schema;
mod spider_queue;

pub use connection::{Database, DbError, QueueBackend, connect_queue};
pub use schema::init_schema;
pub use spider_queue::SpiderQueue;
