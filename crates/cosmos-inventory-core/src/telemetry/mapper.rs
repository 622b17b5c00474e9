use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

use crate::dialects::CosmosDialect;
use crate::models::{
    AccountSnapshot, ContainerSnapshot, CoreError, CoreErrorKind, CoreResult, DatabaseSnapshot,
    ResourceAddress, ThroughputClassification,
};
use crate::telemetry::{
    AccountConfigRecord, ContainerConfigRecord, ContainerMetricRecord, DatabaseConfigRecord,
};

const SERVICES_FIELD: &str = "services";

/// Builds telemetry rows for one task run. Every row of a run shares the same
/// `TimeGenerated`.
#[derive(Clone, Debug)]
pub struct TelemetryMapper {
    time_generated: String,
}

impl TelemetryMapper {
    pub fn at(now: OffsetDateTime) -> CoreResult<Self> {
        Ok(Self {
            time_generated: format_timestamp(now)?,
        })
    }

    pub fn time_generated(&self) -> &str {
        &self.time_generated
    }

    pub fn account_config(
        &self,
        account: &ResourceAddress,
        subscription_name: &str,
        snapshot: &AccountSnapshot,
        service: Option<Value>,
    ) -> AccountConfigRecord {
        let mut additional_data = match &snapshot.raw {
            Value::Object(properties) => properties.clone(),
            _ => Map::new(),
        };
        additional_data.insert(
            SERVICES_FIELD.to_string(),
            service.unwrap_or_else(|| Value::Array(Vec::new())),
        );

        AccountConfigRecord {
            time_generated: self.time_generated.clone(),
            subscription_id: account.subscription_id().to_string(),
            subscription_name: subscription_name.to_string(),
            resource_group: account.resource_group().unwrap_or_default().to_string(),
            database_account_name: account.account_name().unwrap_or_default().to_string(),
            api_kind: snapshot.api_kind(),
            capacity_mode: snapshot.capacity_mode(),
            additional_data: Value::Object(additional_data),
        }
    }

    pub fn database_config(
        &self,
        database: &ResourceAddress,
        snapshot: &DatabaseSnapshot,
        classification: ThroughputClassification,
    ) -> DatabaseConfigRecord {
        DatabaseConfigRecord {
            time_generated: self.time_generated.clone(),
            database_account_name: database.account_name().unwrap_or_default().to_string(),
            database_name: database.name().to_string(),
            database_throughput_mode: classification.mode,
            database_throughput_type: classification.throughput_type,
            database_throughput: classification.value,
            additional_data: snapshot.raw.clone(),
        }
    }

    pub fn container_config(
        &self,
        container: &ResourceAddress,
        snapshot: &ContainerSnapshot,
        classification: ThroughputClassification,
        dialect: &dyn CosmosDialect,
    ) -> ContainerConfigRecord {
        ContainerConfigRecord {
            time_generated: self.time_generated.clone(),
            database_account_name: container.account_name().unwrap_or_default().to_string(),
            database_name: container.database_name().unwrap_or_default().to_string(),
            container_name: container.name().to_string(),
            container_throughput_mode: classification.mode,
            container_throughput_type: classification.throughput_type,
            container_throughput: classification.value,
            container_indexing_is_default: dialect.indexing_is_default(snapshot),
            container_ttl: dialect.container_ttl(snapshot),
            additional_data: snapshot.raw.clone(),
        }
    }

    pub fn container_metric(
        &self,
        container: &ResourceAddress,
        timestamp: OffsetDateTime,
        metric_name: &str,
        value: Option<f64>,
        metadata: Option<Map<String, Value>>,
    ) -> CoreResult<ContainerMetricRecord> {
        Ok(ContainerMetricRecord {
            time_generated: self.time_generated.clone(),
            database_account_name: container.account_name().unwrap_or_default().to_string(),
            database_name: container.database_name().unwrap_or_default().to_string(),
            container_name: container.name().to_string(),
            metric_timestamp: format_timestamp(timestamp)?,
            metric_name: metric_name.to_string(),
            metric_value: value,
            metric_metadata: metadata,
        })
    }
}

/// RFC 3339 in UTC.
pub fn format_timestamp(timestamp: OffsetDateTime) -> CoreResult<String> {
    timestamp
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("failed to format timestamp: {error}"),
            )
        })
}
