use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{ApiKind, CapacityMode, ThroughputMode, ThroughputType};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountConfigRecord {
    pub time_generated: String,
    pub subscription_id: String,
    pub subscription_name: String,
    pub resource_group: String,
    pub database_account_name: String,
    #[serde(rename = "APIKind")]
    pub api_kind: ApiKind,
    pub capacity_mode: CapacityMode,
    pub additional_data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseConfigRecord {
    pub time_generated: String,
    pub database_account_name: String,
    pub database_name: String,
    pub database_throughput_mode: ThroughputMode,
    pub database_throughput_type: Option<ThroughputType>,
    pub database_throughput: Option<i64>,
    pub additional_data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfigRecord {
    pub time_generated: String,
    pub database_account_name: String,
    pub database_name: String,
    pub container_name: String,
    pub container_throughput_mode: ThroughputMode,
    pub container_throughput_type: Option<ThroughputType>,
    pub container_throughput: Option<i64>,
    pub container_indexing_is_default: bool,
    #[serde(rename = "ContainerTTL")]
    pub container_ttl: Option<i64>,
    pub additional_data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerMetricRecord {
    pub time_generated: String,
    pub database_account_name: String,
    pub database_name: String,
    pub container_name: String,
    pub metric_timestamp: String,
    pub metric_name: String,
    pub metric_value: Option<f64>,
    pub metric_metadata: Option<Map<String, Value>>,
}
