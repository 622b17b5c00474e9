use std::time::Duration;

use serde_json::{Map, Value};

use crate::handlers::TaskOutcome;
use crate::models::{
    AddressLevel, Aggregation, COSMOS_METRIC_NAMESPACE, CoreError, CoreErrorKind, CoreResult,
    GetContainerMetricsRequest, MetricKind, MetricsQuery, TimeSeriesElement, TimeWindow,
};
use crate::providers::MetricsProvider;
use crate::telemetry::{TelemetryBatch, TelemetryMapper};

const ONE_MINUTE: Duration = Duration::from_secs(60);
const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

const REQUEST_METRICS: &[&str] = &["TotalRequests", "TotalRequestUnits"];
const THROUGHPUT_METRICS: &[&str] = &["ProvisionedThroughput", "AutoscaleMaxThroughput"];
const STORAGE_METRICS: &[&str] = &["DataUsage", "DocumentCount"];
const INDEX_METRICS: &[&str] = &["IndexUsage"];
const DEDICATED_THROUGHPUT_STORAGE_METRICS: &[&str] = &[
    "ProvisionedThroughput",
    "AutoscaleMaxThroughput",
    "DataUsage",
    "IndexUsage",
    "DocumentCount",
];
const PARTITION_METRICS: &[&str] = &["NormalizedRUConsumption"];

/// Database-level throughput is reported under this collection name.
const SHARED_COLLECTION_NAME: &str = "__Empty";
/// Partition usage of a shared database is reported under this name.
const SHARED_PARTITION_COLLECTION_NAME: &str = "<empty>";

/// Which aggregation carries a metric's value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueReading {
    Fixed(Aggregation),
    /// Throughput metrics read their maximum, everything else its total.
    ThroughputMaximumOtherwiseTotal,
}

impl ValueReading {
    fn aggregation(self, metric_name: &str) -> Aggregation {
        match self {
            Self::Fixed(aggregation) => aggregation,
            Self::ThroughputMaximumOtherwiseTotal => {
                if THROUGHPUT_METRICS.contains(&metric_name) {
                    Aggregation::Maximum
                } else {
                    Aggregation::Total
                }
            }
        }
    }
}

/// Dimensions copied into `MetricMetadata`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetadataShape {
    None,
    Requests,
    PartitionKeyUsage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan {
    pub query: MetricsQuery,
    pub reading: ValueReading,
    pub metadata: MetadataShape,
}

pub fn run(
    metrics: &dyn MetricsProvider,
    mapper: &TelemetryMapper,
    window: TimeWindow,
    request: GetContainerMetricsRequest,
) -> CoreResult<TaskOutcome> {
    let mut records = Vec::new();
    for plan in query_plans(&request, window)? {
        let response = metrics.query_resource(&plan.query)?;
        for metric in &response.metrics {
            let aggregation = plan.reading.aggregation(&metric.name);
            for series in &metric.timeseries {
                let metadata = metadata_for(plan.metadata, series)?;
                for value in &series.data {
                    records.push(mapper.container_metric(
                        &request.container,
                        value.timestamp,
                        &metric.name,
                        value.read(aggregation),
                        metadata.clone(),
                    )?);
                }
            }
        }
    }

    tracing::debug!(
        container = request.container.name(),
        metric = request.metric.as_str(),
        rows = records.len(),
        "collected container metrics"
    );
    Ok(TaskOutcome::default().with_telemetry(TelemetryBatch::ContainerMetrics(records)))
}

/// Queries issued for one metrics task, in order. Metrics are always asked of
/// the account resource and narrowed to the container with dimension filters.
pub fn query_plans(
    request: &GetContainerMetricsRequest,
    window: TimeWindow,
) -> CoreResult<Vec<QueryPlan>> {
    let container = &request.container;
    let account = container.ancestor(AddressLevel::Account)?;
    let database_name = container.database_name().ok_or_else(|| {
        CoreError::new(
            CoreErrorKind::MalformedAddress,
            format!("'{container}' has no database segment"),
        )
    })?;
    let container_name = container.name();

    let plan = |metric_names: &[&str],
                granularity: Duration,
                aggregations: &[Aggregation],
                filter: String,
                reading: ValueReading,
                metadata: MetadataShape| QueryPlan {
        query: MetricsQuery {
            resource: account.clone(),
            metric_names: metric_names.iter().map(|name| name.to_string()).collect(),
            namespace: COSMOS_METRIC_NAMESPACE.to_string(),
            window,
            granularity,
            aggregations: aggregations.to_vec(),
            filter,
        },
        reading,
        metadata,
    };

    let database_filter = format!("DatabaseName eq '{}'", odata_literal(database_name));
    let container_filter = |collection: &str| {
        format!(
            "{database_filter} and CollectionName eq '{}'",
            odata_literal(collection)
        )
    };

    let plans = match request.metric {
        MetricKind::Requests => vec![plan(
            REQUEST_METRICS,
            ONE_MINUTE,
            &[Aggregation::Count],
            format!(
                "{} and OperationType eq '*' and Region eq '*' and StatusCode eq '*'",
                container_filter(container_name)
            ),
            ValueReading::Fixed(Aggregation::Count),
            MetadataShape::Requests,
        )],
        MetricKind::ThroughputStorage if !request.shared_throughput => vec![plan(
            DEDICATED_THROUGHPUT_STORAGE_METRICS,
            FIVE_MINUTES,
            &[Aggregation::Maximum, Aggregation::Total],
            container_filter(container_name),
            ValueReading::ThroughputMaximumOtherwiseTotal,
            MetadataShape::None,
        )],
        MetricKind::ThroughputStorage => vec![
            plan(
                THROUGHPUT_METRICS,
                FIVE_MINUTES,
                &[Aggregation::Maximum],
                container_filter(SHARED_COLLECTION_NAME),
                ValueReading::Fixed(Aggregation::Maximum),
                MetadataShape::None,
            ),
            plan(
                STORAGE_METRICS,
                FIVE_MINUTES,
                &[Aggregation::Total],
                container_filter(container_name),
                ValueReading::Fixed(Aggregation::Total),
                MetadataShape::None,
            ),
            plan(
                INDEX_METRICS,
                FIVE_MINUTES,
                &[Aggregation::Total],
                database_filter.clone(),
                ValueReading::Fixed(Aggregation::Total),
                MetadataShape::None,
            ),
        ],
        MetricKind::PartitionKeyUsage => {
            let collection = if request.shared_throughput {
                SHARED_PARTITION_COLLECTION_NAME
            } else {
                container_name
            };
            vec![plan(
                PARTITION_METRICS,
                ONE_MINUTE,
                &[Aggregation::Maximum],
                format!(
                    "{} and Region eq '*' and PartitionKeyRangeId eq '*' and PhysicalPartitionId eq '*'",
                    container_filter(collection)
                ),
                ValueReading::Fixed(Aggregation::Maximum),
                MetadataShape::PartitionKeyUsage,
            )]
        }
    };

    Ok(plans)
}

fn metadata_for(
    shape: MetadataShape,
    series: &TimeSeriesElement,
) -> CoreResult<Option<Map<String, Value>>> {
    let mut metadata = Map::new();
    match shape {
        MetadataShape::None => return Ok(None),
        MetadataShape::Requests => {
            metadata.insert(
                "OperationType".to_string(),
                Value::String(dimension(series, "operationtype")?.to_string()),
            );
            metadata.insert(
                "Region".to_string(),
                Value::String(dimension(series, "region")?.to_string()),
            );
            let status = dimension(series, "statuscode")?;
            let status: i64 = status.trim().parse().map_err(|_| {
                CoreError::new(
                    CoreErrorKind::ParseFailure,
                    format!("metric dimension 'statuscode' is not an integer: '{status}'"),
                )
            })?;
            metadata.insert("StatusCode".to_string(), Value::from(status));
        }
        MetadataShape::PartitionKeyUsage => {
            for (key, column) in [
                ("region", "Region"),
                ("partitionkeyrangeid", "PartitionKeyRangeId"),
                ("physicalpartitionid", "PhysicalPartitionId"),
            ] {
                metadata.insert(
                    column.to_string(),
                    Value::String(dimension(series, key)?.to_string()),
                );
            }
        }
    }
    Ok(Some(metadata))
}

fn dimension<'a>(series: &'a TimeSeriesElement, key: &str) -> CoreResult<&'a str> {
    series
        .metadata_values
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| {
            CoreError::new(
                CoreErrorKind::ParseFailure,
                format!("metric series is missing dimension '{key}'"),
            )
        })
}

fn odata_literal(value: &str) -> String {
    value.replace('\'', "''")
}
