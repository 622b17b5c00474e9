use std::sync::Arc;

use time::OffsetDateTime;

use crate::clients::ClientCache;
use crate::config::WorkerConfig;
use crate::providers::ClientFactory;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Everything a worker shares across tasks.
pub struct WorkerContext {
    pub clients: ClientCache,
    pub config: WorkerConfig,
    pub clock: Arc<dyn Clock>,
}

impl WorkerContext {
    pub fn new(factory: Arc<dyn ClientFactory>, config: WorkerConfig) -> Self {
        Self {
            clients: ClientCache::new(factory, config.data_collection_endpoint.clone()),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
