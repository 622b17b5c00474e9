use crate::clients::CollaboratorKind;
use crate::models::task::{
    ACCOUNT_DATA_FIELD, API_KIND_FIELD, CONTAINER_DATA_FIELD, DATABASE_DATA_FIELD,
    METRIC_TYPE_FIELD, SUBSCRIPTION_NAME_FIELD,
};
use crate::models::{AddressLevel, TaskKind};
use crate::telemetry::TelemetryStream;

/// Static contract of one task kind: where its `rid` points, which
/// `taskData` fields must be present, and what it needs at dispatch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TaskDescriptor {
    pub kind: TaskKind,
    pub address_level: Option<AddressLevel>,
    pub required_fields: &'static [&'static str],
    pub collaborators: &'static [CollaboratorKind],
    pub telemetry: Option<TelemetryStream>,
}

const DIRECTORY_ONLY: &[CollaboratorKind] = &[CollaboratorKind::SubscriptionDirectory];
const PROVIDER_ONLY: &[CollaboratorKind] = &[CollaboratorKind::ResourceProvider];
const PROVIDER_AND_SINK: &[CollaboratorKind] = &[
    CollaboratorKind::ResourceProvider,
    CollaboratorKind::TelemetrySink,
];
const METRICS_AND_SINK: &[CollaboratorKind] = &[
    CollaboratorKind::MetricsProvider,
    CollaboratorKind::TelemetrySink,
];

// Ordered like `TaskKind`.
const ALL_TASKS: [TaskDescriptor; 8] = [
    TaskDescriptor {
        kind: TaskKind::ListVisibleSubscriptions,
        address_level: None,
        required_fields: &[],
        collaborators: DIRECTORY_ONLY,
        telemetry: None,
    },
    TaskDescriptor {
        kind: TaskKind::ListDatabaseAccounts,
        address_level: Some(AddressLevel::Subscription),
        required_fields: &[SUBSCRIPTION_NAME_FIELD],
        collaborators: PROVIDER_ONLY,
        telemetry: None,
    },
    TaskDescriptor {
        kind: TaskKind::GetAccountServices,
        address_level: Some(AddressLevel::Account),
        required_fields: &[SUBSCRIPTION_NAME_FIELD, ACCOUNT_DATA_FIELD],
        collaborators: PROVIDER_AND_SINK,
        telemetry: Some(TelemetryStream::AccountConfig),
    },
    TaskDescriptor {
        kind: TaskKind::ListDatabases,
        address_level: Some(AddressLevel::Account),
        required_fields: &[API_KIND_FIELD],
        collaborators: PROVIDER_ONLY,
        telemetry: None,
    },
    TaskDescriptor {
        kind: TaskKind::GetDatabaseThroughput,
        address_level: Some(AddressLevel::Database),
        required_fields: &[API_KIND_FIELD, DATABASE_DATA_FIELD],
        collaborators: PROVIDER_AND_SINK,
        telemetry: Some(TelemetryStream::DatabaseConfig),
    },
    TaskDescriptor {
        kind: TaskKind::ListContainers,
        address_level: Some(AddressLevel::Database),
        required_fields: &[API_KIND_FIELD],
        collaborators: PROVIDER_ONLY,
        telemetry: None,
    },
    TaskDescriptor {
        kind: TaskKind::GetContainerThroughput,
        address_level: Some(AddressLevel::Container),
        required_fields: &[API_KIND_FIELD, CONTAINER_DATA_FIELD],
        collaborators: PROVIDER_AND_SINK,
        telemetry: Some(TelemetryStream::ContainerConfig),
    },
    TaskDescriptor {
        kind: TaskKind::GetContainerMetrics,
        address_level: Some(AddressLevel::Container),
        required_fields: &[API_KIND_FIELD, METRIC_TYPE_FIELD],
        collaborators: METRICS_AND_SINK,
        telemetry: Some(TelemetryStream::ContainerMetrics),
    },
];

pub fn tasks() -> &'static [TaskDescriptor] {
    &ALL_TASKS
}

pub fn task_descriptor(kind: TaskKind) -> &'static TaskDescriptor {
    &ALL_TASKS[kind as usize]
}
