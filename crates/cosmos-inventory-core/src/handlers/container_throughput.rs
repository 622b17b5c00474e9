use crate::dialects::dialect_for;
use crate::handlers::TaskOutcome;
use crate::models::{
    CoreResult, GetContainerMetricsRequest, GetContainerThroughputRequest, MetricKind,
    ResourceLevel, TaskRequest, ThroughputClassification,
};
use crate::providers::ResourceProvider;
use crate::telemetry::{TelemetryBatch, TelemetryMapper};

/// Reports the container configuration and fans out one metrics task per
/// metric kind, all carrying the container's shared-throughput flag.
pub fn run(
    provider: &dyn ResourceProvider,
    mapper: &TelemetryMapper,
    request: GetContainerThroughputRequest,
) -> CoreResult<TaskOutcome> {
    let dialect = dialect_for(request.api_kind);
    let lookup = dialect.container_throughput(provider, &request.container)?;
    let classification = ThroughputClassification::classify(ResourceLevel::Container, lookup);
    let record =
        mapper.container_config(&request.container, &request.snapshot, classification, dialect);

    let follow_ups = MetricKind::ALL
        .into_iter()
        .map(|metric| {
            TaskRequest::GetContainerMetrics(GetContainerMetricsRequest {
                container: request.container.clone(),
                api_kind: request.api_kind,
                metric,
                shared_throughput: classification.is_shared(),
            })
            .into_envelope()
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(TaskOutcome::follow_ups(follow_ups)
        .with_telemetry(TelemetryBatch::ContainerConfig(vec![record])))
}
