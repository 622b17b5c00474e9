use crate::handlers::TaskOutcome;
use crate::models::{
    CoreResult, GetAccountServicesRequest, ListDatabaseAccountsRequest, TaskRequest,
};
use crate::providers::{ResourceProvider, parse_accounts};

pub fn run(
    provider: &dyn ResourceProvider,
    request: ListDatabaseAccountsRequest,
) -> CoreResult<TaskOutcome> {
    let body = provider.list_database_accounts()?;
    let follow_ups = parse_accounts(&body)?
        .into_iter()
        .map(|snapshot| {
            TaskRequest::GetAccountServices(GetAccountServicesRequest {
                account: snapshot.id.clone(),
                subscription_name: request.subscription_name.clone(),
                snapshot,
            })
            .into_envelope()
        })
        .collect::<CoreResult<Vec<_>>>()?;

    tracing::debug!(
        subscription = request.subscription.subscription_id(),
        accounts = follow_ups.len(),
        "listed database accounts"
    );
    Ok(TaskOutcome::follow_ups(follow_ups))
}
