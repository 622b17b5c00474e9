use std::env;

use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::telemetry::TelemetryStream;

pub const DATA_COLLECTION_ENDPOINT_VAR: &str = "AzureMonitorDataCollectionEndpoint";
pub const RULE_ID_VAR_PREFIX: &str = "AzureMonitorDataCollectionRuleId";
pub const STREAM_NAME_VAR_PREFIX: &str = "AzureMonitorDataCollectionStreamName";

pub const MAX_IN_FLIGHT_VAR: &str = "COSMOS_INVENTORY_MAX_IN_FLIGHT";
pub const MAX_ATTEMPTS_VAR: &str = "COSMOS_INVENTORY_MAX_ATTEMPTS";

/// Where one telemetry stream is ingested.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StreamTarget {
    pub rule_id: String,
    pub stream_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerConfig {
    pub data_collection_endpoint: String,
    account_config: StreamTarget,
    database_config: StreamTarget,
    container_config: StreamTarget,
    container_metrics: StreamTarget,
}

impl WorkerConfig {
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Every stream needs both its rule id and stream name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let required = |name: String| -> CoreResult<String> {
            lookup(&name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    CoreError::new(
                        CoreErrorKind::InvalidInput,
                        format!("missing configuration variable '{name}'"),
                    )
                })
        };
        let target = |stream: TelemetryStream| -> CoreResult<StreamTarget> {
            Ok(StreamTarget {
                rule_id: required(format!("{RULE_ID_VAR_PREFIX}{}", stream.config_suffix()))?,
                stream_name: required(format!(
                    "{STREAM_NAME_VAR_PREFIX}{}",
                    stream.config_suffix()
                ))?,
            })
        };

        Ok(Self {
            data_collection_endpoint: required(DATA_COLLECTION_ENDPOINT_VAR.to_string())?,
            account_config: target(TelemetryStream::AccountConfig)?,
            database_config: target(TelemetryStream::DatabaseConfig)?,
            container_config: target(TelemetryStream::ContainerConfig)?,
            container_metrics: target(TelemetryStream::ContainerMetrics)?,
        })
    }

    pub fn stream_target(&self, stream: TelemetryStream) -> &StreamTarget {
        match stream {
            TelemetryStream::AccountConfig => &self.account_config,
            TelemetryStream::DatabaseConfig => &self.database_config,
            TelemetryStream::ContainerConfig => &self.container_config,
            TelemetryStream::ContainerMetrics => &self.container_metrics,
        }
    }
}

/// Limits for the in-process crawl driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CrawlQueueConfig {
    pub max_in_flight: usize,
    pub max_attempts: u32,
}

impl Default for CrawlQueueConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            max_attempts: 3,
        }
    }
}

impl CrawlQueueConfig {
    pub fn from_env() -> CoreResult<Self> {
        Self::default().with_overrides(|name| env::var(name).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        if let Some(value) = lookup(MAX_IN_FLIGHT_VAR) {
            self.max_in_flight = parse_positive(MAX_IN_FLIGHT_VAR, &value)?;
        }
        if let Some(value) = lookup(MAX_ATTEMPTS_VAR) {
            self.max_attempts = parse_positive(MAX_ATTEMPTS_VAR, &value)?;
        }
        Ok(self)
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

fn parse_positive<T>(name: &str, value: &str) -> CoreResult<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("configuration variable '{name}' must be a positive integer, got '{value}'"),
        )),
    }
}
