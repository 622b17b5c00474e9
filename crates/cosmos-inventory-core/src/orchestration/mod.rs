pub mod crawl_queue;

pub use crawl_queue::{CrawlReport, InMemoryCrawlQueue};

use crate::models::CoreError;

pub type OrchestrationResult<T> = Result<T, CoreError>;
