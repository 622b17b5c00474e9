use crate::dialects::dialect_for;
use crate::handlers::TaskOutcome;
use crate::models::{
    CoreResult, GetContainerThroughputRequest, ListContainersRequest, TaskRequest,
};
use crate::providers::ResourceProvider;

/// Container addresses come from the dialect, so table accounts already
/// point into their placeholder database here.
pub fn run(provider: &dyn ResourceProvider, request: ListContainersRequest) -> CoreResult<TaskOutcome> {
    let dialect = dialect_for(request.api_kind);
    let follow_ups = dialect
        .list_containers(provider, &request.database)?
        .into_iter()
        .map(|snapshot| {
            TaskRequest::GetContainerThroughput(GetContainerThroughputRequest {
                container: snapshot.id.clone(),
                api_kind: request.api_kind,
                snapshot,
            })
            .into_envelope()
        })
        .collect::<CoreResult<Vec<_>>>()?;

    tracing::debug!(
        database = request.database.name(),
        containers = follow_ups.len(),
        "listed containers"
    );
    Ok(TaskOutcome::follow_ups(follow_ups))
}
