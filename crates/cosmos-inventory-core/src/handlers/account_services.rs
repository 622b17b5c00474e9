use crate::handlers::TaskOutcome;
use crate::models::{CoreResult, GetAccountServicesRequest, ListDatabasesRequest, TaskRequest};
use crate::providers::{ResourceProvider, parse_first_service};
use crate::telemetry::{TelemetryBatch, TelemetryMapper};

/// Reports the account configuration and starts the database listing with
/// the account's dialect.
pub fn run(
    provider: &dyn ResourceProvider,
    mapper: &TelemetryMapper,
    request: GetAccountServicesRequest,
) -> CoreResult<TaskOutcome> {
    let body = provider.list_account_services(&request.account)?;
    let service = parse_first_service(&body)?;
    let record = mapper.account_config(
        &request.account,
        &request.subscription_name,
        &request.snapshot,
        service,
    );

    let follow_up = TaskRequest::ListDatabases(ListDatabasesRequest {
        api_kind: record.api_kind,
        account: request.account,
    })
    .into_envelope()?;

    Ok(TaskOutcome::follow_ups(vec![follow_up])
        .with_telemetry(TelemetryBatch::AccountConfig(vec![record])))
}
