use crate::handlers::TaskOutcome;
use crate::models::{CoreResult, ListDatabaseAccountsRequest, TaskRequest};
use crate::providers::{SubscriptionDirectory, parse_subscriptions};

/// One `ListCosmosDatabaseAccounts` per visible subscription.
pub fn run(directory: &dyn SubscriptionDirectory) -> CoreResult<TaskOutcome> {
    let body = directory.list_subscriptions()?;
    let follow_ups = parse_subscriptions(&body)?
        .into_iter()
        .map(|subscription| {
            TaskRequest::ListDatabaseAccounts(ListDatabaseAccountsRequest {
                subscription: subscription.address,
                subscription_name: subscription.display_name,
            })
            .into_envelope()
        })
        .collect::<CoreResult<Vec<_>>>()?;

    tracing::debug!(subscriptions = follow_ups.len(), "listed visible subscriptions");
    Ok(TaskOutcome::follow_ups(follow_ups))
}
