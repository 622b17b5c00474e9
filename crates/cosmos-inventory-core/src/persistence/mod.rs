use time::OffsetDateTime;

use crate::models::{CoreError, CoreErrorKind, TaskKind};

pub type PersistenceResult<T> = Result<T, CoreError>;

pub trait MigrationStore: Send + Sync {
    fn current_version(&self) -> PersistenceResult<i64>;

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()>;
}

/// A message that will not be retried, kept with the failure that ended it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeadLetter {
    pub message: String,
    pub task: Option<TaskKind>,
    pub error_kind: CoreErrorKind,
    pub error_message: String,
    pub attempts: u32,
    pub recorded_at: OffsetDateTime,
}

impl DeadLetter {
    pub fn from_failure(
        message: String,
        error: &CoreError,
        attempts: u32,
        recorded_at: OffsetDateTime,
    ) -> Self {
        Self {
            message,
            task: error.task,
            error_kind: error.kind,
            error_message: error.message.clone(),
            attempts,
            recorded_at,
        }
    }
}

pub trait DeadLetterStore: Send + Sync {
    fn record_dead_letter(&self, dead_letter: &DeadLetter) -> PersistenceResult<()>;

    fn list_dead_letters(&self, limit: usize) -> PersistenceResult<Vec<DeadLetter>>;
}

/// One uploaded telemetry row as the local sink stored it.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredTelemetryRow {
    pub rule_id: String,
    pub stream_name: String,
    pub payload: serde_json::Value,
}
