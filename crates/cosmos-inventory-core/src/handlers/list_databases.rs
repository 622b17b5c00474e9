use crate::dialects::dialect_for;
use crate::handlers::TaskOutcome;
use crate::models::{CoreResult, GetDatabaseThroughputRequest, ListDatabasesRequest, TaskRequest};
use crate::providers::ResourceProvider;

pub fn run(provider: &dyn ResourceProvider, request: ListDatabasesRequest) -> CoreResult<TaskOutcome> {
    let dialect = dialect_for(request.api_kind);
    let follow_ups = dialect
        .list_databases(provider, &request.account)?
        .into_iter()
        .map(|snapshot| {
            TaskRequest::GetDatabaseThroughput(GetDatabaseThroughputRequest {
                database: snapshot.id.clone(),
                api_kind: request.api_kind,
                snapshot,
            })
            .into_envelope()
        })
        .collect::<CoreResult<Vec<_>>>()?;

    tracing::debug!(
        account = request.account.name(),
        api_kind = request.api_kind.as_str(),
        databases = follow_ups.len(),
        "listed databases"
    );
    Ok(TaskOutcome::follow_ups(follow_ups))
}
