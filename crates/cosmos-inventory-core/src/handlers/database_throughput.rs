use crate::dialects::dialect_for;
use crate::handlers::TaskOutcome;
use crate::models::{
    CoreResult, GetDatabaseThroughputRequest, ListContainersRequest, ResourceLevel,
    TaskRequest, ThroughputClassification,
};
use crate::providers::ResourceProvider;
use crate::telemetry::{TelemetryBatch, TelemetryMapper};

pub fn run(
    provider: &dyn ResourceProvider,
    mapper: &TelemetryMapper,
    request: GetDatabaseThroughputRequest,
) -> CoreResult<TaskOutcome> {
    let dialect = dialect_for(request.api_kind);
    let lookup = dialect.database_throughput(provider, &request.database)?;
    let classification = ThroughputClassification::classify(ResourceLevel::Database, lookup);
    let record = mapper.database_config(&request.database, &request.snapshot, classification);

    let follow_up = TaskRequest::ListContainers(ListContainersRequest {
        database: request.database,
        api_kind: request.api_kind,
    })
    .into_envelope()?;

    Ok(TaskOutcome::follow_ups(vec![follow_up])
        .with_telemetry(TelemetryBatch::DatabaseConfig(vec![record])))
}
