pub mod account_services;
pub mod container_metrics;
pub mod container_throughput;
pub mod database_throughput;
pub mod list_accounts;
pub mod list_containers;
pub mod list_databases;
pub mod list_subscriptions;

use crate::context::WorkerContext;
use crate::models::{CoreError, CoreErrorKind, CoreResult, TaskEnvelope, TaskRequest, TimeWindow};
use crate::telemetry::{TelemetryBatch, TelemetryMapper};

/// What a handler hands back: the next tasks and at most one telemetry batch.
/// Handlers never enqueue or upload themselves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskOutcome {
    pub follow_ups: Vec<TaskEnvelope>,
    pub telemetry: Option<TelemetryBatch>,
}

impl TaskOutcome {
    pub fn follow_ups(follow_ups: Vec<TaskEnvelope>) -> Self {
        Self {
            follow_ups,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, batch: TelemetryBatch) -> Self {
        self.telemetry = Some(batch);
        self
    }
}

/// Runs one validated request against the context's collaborators. The
/// router has already ensured every handle the request needs.
pub fn handle(context: &WorkerContext, request: TaskRequest) -> CoreResult<TaskOutcome> {
    let clients = &context.clients;
    let subscription = request
        .address()
        .map(|address| address.subscription_id().to_string());
    let resource_provider = || {
        let subscription_id = subscription.as_deref().ok_or_else(|| {
            CoreError::new(CoreErrorKind::Internal, "task carries no subscription")
        })?;
        clients.resource_provider(subscription_id)
    };

    match request {
        TaskRequest::ListVisibleSubscriptions => {
            list_subscriptions::run(clients.subscription_directory()?.as_ref())
        }
        TaskRequest::ListDatabaseAccounts(request) => {
            list_accounts::run(resource_provider()?.as_ref(), request)
        }
        TaskRequest::GetAccountServices(request) => account_services::run(
            resource_provider()?.as_ref(),
            &TelemetryMapper::at(context.clock.now())?,
            request,
        ),
        TaskRequest::ListDatabases(request) => {
            list_databases::run(resource_provider()?.as_ref(), request)
        }
        TaskRequest::GetDatabaseThroughput(request) => database_throughput::run(
            resource_provider()?.as_ref(),
            &TelemetryMapper::at(context.clock.now())?,
            request,
        ),
        TaskRequest::ListContainers(request) => {
            list_containers::run(resource_provider()?.as_ref(), request)
        }
        TaskRequest::GetContainerThroughput(request) => container_throughput::run(
            resource_provider()?.as_ref(),
            &TelemetryMapper::at(context.clock.now())?,
            request,
        ),
        TaskRequest::GetContainerMetrics(request) => {
            let now = context.clock.now();
            container_metrics::run(
                clients.metrics_provider()?.as_ref(),
                &TelemetryMapper::at(now)?,
                TimeWindow::previous_utc_day(now),
                request,
            )
        }
    }
}
