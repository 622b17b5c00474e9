use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Time, UtcOffset};

use crate::models::{CoreError, CoreErrorKind, ResourceAddress};

pub const COSMOS_METRIC_NAMESPACE: &str = "microsoft.documentdb/databaseaccounts";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Requests,
    ThroughputStorage,
    PartitionKeyUsage,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Requests,
        MetricKind::ThroughputStorage,
        MetricKind::PartitionKeyUsage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requests => "Requests",
            Self::ThroughputStorage => "ThroughputStorage",
            Self::PartitionKeyUsage => "PartitionKeyUsage",
        }
    }
}

impl FromStr for MetricKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorKind::InvalidInput,
                    format!("unknown metric type '{value}'"),
                )
            })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Aggregation {
    Count,
    Maximum,
    Total,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeWindow {
    /// The full UTC day before `now`, ending at today's midnight.
    pub fn previous_utc_day(now: OffsetDateTime) -> Self {
        let end = now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT);
        Self {
            start: end - time::Duration::days(1),
            end,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetricsQuery {
    pub resource: ResourceAddress,
    pub metric_names: Vec<String>,
    pub namespace: String,
    pub window: TimeWindow,
    pub granularity: Duration,
    pub aggregations: Vec<Aggregation>,
    pub filter: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsResponse {
    pub metrics: Vec<Metric>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub name: String,
    pub timeseries: Vec<TimeSeriesElement>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeriesElement {
    /// Dimension values keyed by lower-cased dimension name.
    pub metadata_values: BTreeMap<String, String>,
    pub data: Vec<MetricValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricValue {
    pub timestamp: OffsetDateTime,
    pub count: Option<f64>,
    pub maximum: Option<f64>,
    pub total: Option<f64>,
}

impl MetricValue {
    pub fn read(&self, aggregation: Aggregation) -> Option<f64> {
        match aggregation {
            Aggregation::Count => self.count,
            Aggregation::Maximum => self.maximum,
            Aggregation::Total => self.total,
        }
    }
}
