pub mod mapper;
pub mod records;

use serde::Serialize;
use serde_json::Value;

use crate::models::{CoreError, CoreErrorKind, CoreResult};

pub use mapper::TelemetryMapper;
pub use records::{
    AccountConfigRecord, ContainerConfigRecord, ContainerMetricRecord, DatabaseConfigRecord,
};

/// Destination table family for uploaded rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TelemetryStream {
    AccountConfig,
    DatabaseConfig,
    ContainerConfig,
    ContainerMetrics,
}

impl TelemetryStream {
    pub const ALL: [TelemetryStream; 4] = [
        TelemetryStream::AccountConfig,
        TelemetryStream::DatabaseConfig,
        TelemetryStream::ContainerConfig,
        TelemetryStream::ContainerMetrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountConfig => "account_config",
            Self::DatabaseConfig => "database_config",
            Self::ContainerConfig => "container_config",
            Self::ContainerMetrics => "container_metrics",
        }
    }

    /// Suffix of the rule id and stream name environment variables.
    pub fn config_suffix(self) -> &'static str {
        match self {
            Self::AccountConfig => "DatabaseAccountsConfig",
            Self::DatabaseConfig => "DatabasesConfig",
            Self::ContainerConfig => "ContainersConfig",
            Self::ContainerMetrics => "ContainersMetrics",
        }
    }
}

/// Rows produced by one task, all bound for the same stream.
#[derive(Clone, Debug, PartialEq)]
pub enum TelemetryBatch {
    AccountConfig(Vec<AccountConfigRecord>),
    DatabaseConfig(Vec<DatabaseConfigRecord>),
    ContainerConfig(Vec<ContainerConfigRecord>),
    ContainerMetrics(Vec<ContainerMetricRecord>),
}

impl TelemetryBatch {
    pub fn stream(&self) -> TelemetryStream {
        match self {
            Self::AccountConfig(_) => TelemetryStream::AccountConfig,
            Self::DatabaseConfig(_) => TelemetryStream::DatabaseConfig,
            Self::ContainerConfig(_) => TelemetryStream::ContainerConfig,
            Self::ContainerMetrics(_) => TelemetryStream::ContainerMetrics,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::AccountConfig(rows) => rows.len(),
            Self::DatabaseConfig(rows) => rows.len(),
            Self::ContainerConfig(rows) => rows.len(),
            Self::ContainerMetrics(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as the JSON objects handed to the sink.
    pub fn rows(&self) -> CoreResult<Vec<Value>> {
        match self {
            Self::AccountConfig(rows) => to_rows(rows),
            Self::DatabaseConfig(rows) => to_rows(rows),
            Self::ContainerConfig(rows) => to_rows(rows),
            Self::ContainerMetrics(rows) => to_rows(rows),
        }
    }
}

fn to_rows<T: Serialize>(records: &[T]) -> CoreResult<Vec<Value>> {
    records
        .iter()
        .map(|record| {
            serde_json::to_value(record).map_err(|error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("failed to serialize telemetry record: {error}"),
                )
            })
        })
        .collect()
}
