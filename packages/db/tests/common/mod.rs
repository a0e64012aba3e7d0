use crawl_core::JobRequest;
use db::{DbError, QueueBackend, SpiderQueue};

pub async fn memory_queue(name: &str) -> Result<SpiderQueue, DbError> {
    SpiderQueue::open(format!("dbs/{name}.db"), QueueBackend::Memory).await
}

pub fn request(spider: &str) -> JobRequest {
    JobRequest::new("demo", spider)
}
