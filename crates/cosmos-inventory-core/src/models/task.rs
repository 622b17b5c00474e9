use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::continuation::ContinuationToken;
use crate::models::{
    AccountSnapshot, AddressLevel, ApiKind, ContainerSnapshot, CoreError, CoreErrorKind,
    CoreResult, DatabaseSnapshot, MetricKind, ResourceAddress,
};
use crate::registry;

pub const SUBSCRIPTION_NAME_FIELD: &str = "subscriptionName";
pub const ACCOUNT_DATA_FIELD: &str = "accountData";
pub const DATABASE_DATA_FIELD: &str = "databaseData";
pub const CONTAINER_DATA_FIELD: &str = "containerData";
pub const API_KIND_FIELD: &str = "APIKind";
pub const METRIC_TYPE_FIELD: &str = "metricType";
pub const SHARED_THROUGHPUT_FIELD: &str = "isSharedThroughput";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    ListVisibleSubscriptions,
    ListDatabaseAccounts,
    GetAccountServices,
    ListDatabases,
    GetDatabaseThroughput,
    ListContainers,
    GetContainerThroughput,
    GetContainerMetrics,
}

impl TaskKind {
    pub const ALL: [TaskKind; 8] = [
        TaskKind::ListVisibleSubscriptions,
        TaskKind::ListDatabaseAccounts,
        TaskKind::GetAccountServices,
        TaskKind::ListDatabases,
        TaskKind::GetDatabaseThroughput,
        TaskKind::ListContainers,
        TaskKind::GetContainerThroughput,
        TaskKind::GetContainerMetrics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListVisibleSubscriptions => "ListVisibleSubscriptions",
            Self::ListDatabaseAccounts => "ListCosmosDatabaseAccounts",
            Self::GetAccountServices => "GetCosmosDatabaseAccountServices",
            Self::ListDatabases => "ListCosmosDatabases",
            Self::GetDatabaseThroughput => "GetCosmosDatabaseThroughput",
            Self::ListContainers => "ListCosmosContainers",
            Self::GetContainerThroughput => "GetCosmosContainerThroughput",
            Self::GetContainerMetrics => "GetCosmosContainerMetrics",
        }
    }
}

impl FromStr for TaskKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorKind::UnrecognizedTask,
                    format!("unrecognized task '{value}'"),
                )
            })
    }
}

/// Wire form of one unit of work: `{"task": …, "rid": …, "taskData": {…}}`.
///
/// Envelopes are immutable once built. `task` stays a plain string so an
/// unknown kind surfaces as `UnrecognizedTask` at dispatch rather than as a
/// decoding failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rid: Option<String>,
    #[serde(
        rename = "taskData",
        default,
        deserialize_with = "null_as_empty_map",
        skip_serializing_if = "Map::is_empty"
    )]
    task_data: Map<String, Value>,
}

impl TaskEnvelope {
    pub fn new(
        task: impl Into<String>,
        rid: Option<String>,
        task_data: Map<String, Value>,
    ) -> Self {
        Self {
            task: task.into(),
            rid,
            task_data,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn rid(&self) -> Option<&str> {
        self.rid.as_deref()
    }

    pub fn task_data(&self) -> &Map<String, Value> {
        &self.task_data
    }

    pub fn from_message(message: &str) -> CoreResult<Self> {
        serde_json::from_str(message).map_err(|error| {
            CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("task message is not a valid envelope: {error}"),
            )
        })
    }

    pub fn to_message(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("failed to encode task envelope: {error}"),
            )
        })
    }
}

fn null_as_empty_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Option::<Map<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Root of every crawl.
pub fn seed_envelope() -> TaskEnvelope {
    TaskEnvelope::new(
        TaskKind::ListVisibleSubscriptions.as_str(),
        None,
        Map::new(),
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListDatabaseAccountsRequest {
    pub subscription: ResourceAddress,
    pub subscription_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetAccountServicesRequest {
    pub account: ResourceAddress,
    pub subscription_name: String,
    pub snapshot: AccountSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListDatabasesRequest {
    pub account: ResourceAddress,
    pub api_kind: ApiKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetDatabaseThroughputRequest {
    pub database: ResourceAddress,
    pub api_kind: ApiKind,
    pub snapshot: DatabaseSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListContainersRequest {
    pub database: ResourceAddress,
    pub api_kind: ApiKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetContainerThroughputRequest {
    pub container: ResourceAddress,
    pub api_kind: ApiKind,
    pub snapshot: ContainerSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GetContainerMetricsRequest {
    pub container: ResourceAddress,
    pub api_kind: ApiKind,
    pub metric: MetricKind,
    pub shared_throughput: bool,
}

/// Validated, typed form of an envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskRequest {
    ListVisibleSubscriptions,
    ListDatabaseAccounts(ListDatabaseAccountsRequest),
    GetAccountServices(GetAccountServicesRequest),
    ListDatabases(ListDatabasesRequest),
    GetDatabaseThroughput(GetDatabaseThroughputRequest),
    ListContainers(ListContainersRequest),
    GetContainerThroughput(GetContainerThroughputRequest),
    GetContainerMetrics(GetContainerMetricsRequest),
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::ListVisibleSubscriptions => TaskKind::ListVisibleSubscriptions,
            Self::ListDatabaseAccounts(_) => TaskKind::ListDatabaseAccounts,
            Self::GetAccountServices(_) => TaskKind::GetAccountServices,
            Self::ListDatabases(_) => TaskKind::ListDatabases,
            Self::GetDatabaseThroughput(_) => TaskKind::GetDatabaseThroughput,
            Self::ListContainers(_) => TaskKind::ListContainers,
            Self::GetContainerThroughput(_) => TaskKind::GetContainerThroughput,
            Self::GetContainerMetrics(_) => TaskKind::GetContainerMetrics,
        }
    }

    pub fn address(&self) -> Option<&ResourceAddress> {
        match self {
            Self::ListVisibleSubscriptions => None,
            Self::ListDatabaseAccounts(request) => Some(&request.subscription),
            Self::GetAccountServices(request) => Some(&request.account),
            Self::ListDatabases(request) => Some(&request.account),
            Self::GetDatabaseThroughput(request) => Some(&request.database),
            Self::ListContainers(request) => Some(&request.database),
            Self::GetContainerThroughput(request) => Some(&request.container),
            Self::GetContainerMetrics(request) => Some(&request.container),
        }
    }

    pub fn api_kind(&self) -> Option<ApiKind> {
        match self {
            Self::ListVisibleSubscriptions
            | Self::ListDatabaseAccounts(_)
            | Self::GetAccountServices(_) => None,
            Self::ListDatabases(request) => Some(request.api_kind),
            Self::GetDatabaseThroughput(request) => Some(request.api_kind),
            Self::ListContainers(request) => Some(request.api_kind),
            Self::GetContainerThroughput(request) => Some(request.api_kind),
            Self::GetContainerMetrics(request) => Some(request.api_kind),
        }
    }

    pub fn from_envelope(envelope: &TaskEnvelope) -> CoreResult<Self> {
        let kind: TaskKind = envelope.task().parse()?;
        let descriptor = registry::task_descriptor(kind);
        let data = envelope.task_data();

        if let Some(missing) = descriptor
            .required_fields
            .iter()
            .find(|field| !data.contains_key(**field))
        {
            return Err(invalid_data(kind, format!("missing task data field '{missing}'")));
        }

        let address = match descriptor.address_level {
            Some(level) => Some(parse_rid(kind, envelope.rid(), level)?),
            None => None,
        };

        let request = match (kind, address) {
            (TaskKind::ListVisibleSubscriptions, _) => Self::ListVisibleSubscriptions,
            (TaskKind::ListDatabaseAccounts, Some(subscription)) => {
                Self::ListDatabaseAccounts(ListDatabaseAccountsRequest {
                    subscription,
                    subscription_name: string_field(kind, data, SUBSCRIPTION_NAME_FIELD)?,
                })
            }
            (TaskKind::GetAccountServices, Some(account)) => {
                Self::GetAccountServices(GetAccountServicesRequest {
                    account,
                    subscription_name: string_field(kind, data, SUBSCRIPTION_NAME_FIELD)?,
                    snapshot: token_field(kind, data, ACCOUNT_DATA_FIELD)?,
                })
            }
            (TaskKind::ListDatabases, Some(account)) => Self::ListDatabases(ListDatabasesRequest {
                account,
                api_kind: api_kind_field(kind, data)?,
            }),
            (TaskKind::GetDatabaseThroughput, Some(database)) => {
                Self::GetDatabaseThroughput(GetDatabaseThroughputRequest {
                    database,
                    api_kind: api_kind_field(kind, data)?,
                    snapshot: token_field(kind, data, DATABASE_DATA_FIELD)?,
                })
            }
            (TaskKind::ListContainers, Some(database)) => {
                Self::ListContainers(ListContainersRequest {
                    database,
                    api_kind: api_kind_field(kind, data)?,
                })
            }
            (TaskKind::GetContainerThroughput, Some(container)) => {
                Self::GetContainerThroughput(GetContainerThroughputRequest {
                    container,
                    api_kind: api_kind_field(kind, data)?,
                    snapshot: token_field(kind, data, CONTAINER_DATA_FIELD)?,
                })
            }
            (TaskKind::GetContainerMetrics, Some(container)) => {
                let metric = string_field(kind, data, METRIC_TYPE_FIELD)?
                    .parse::<MetricKind>()
                    .map_err(|error| error.with_task(kind))?;
                Self::GetContainerMetrics(GetContainerMetricsRequest {
                    container,
                    api_kind: api_kind_field(kind, data)?,
                    metric,
                    shared_throughput: bool_field_or_false(kind, data, SHARED_THROUGHPUT_FIELD)?,
                })
            }
            (_, None) => {
                return Err(invalid_data(kind, "task requires a resource address".to_string()));
            }
        };

        Ok(request)
    }

    pub fn into_envelope(self) -> CoreResult<TaskEnvelope> {
        let kind = self.kind();
        let mut data = Map::new();

        let rid = match self {
            Self::ListVisibleSubscriptions => None,
            Self::ListDatabaseAccounts(request) => {
                data.insert(
                    SUBSCRIPTION_NAME_FIELD.to_string(),
                    Value::String(request.subscription_name),
                );
                Some(request.subscription)
            }
            Self::GetAccountServices(request) => {
                data.insert(
                    ACCOUNT_DATA_FIELD.to_string(),
                    token_value(&request.snapshot)?,
                );
                data.insert(
                    SUBSCRIPTION_NAME_FIELD.to_string(),
                    Value::String(request.subscription_name),
                );
                Some(request.account)
            }
            Self::ListDatabases(request) => {
                insert_api_kind(&mut data, request.api_kind);
                Some(request.account)
            }
            Self::GetDatabaseThroughput(request) => {
                data.insert(
                    DATABASE_DATA_FIELD.to_string(),
                    token_value(&request.snapshot)?,
                );
                insert_api_kind(&mut data, request.api_kind);
                Some(request.database)
            }
            Self::ListContainers(request) => {
                insert_api_kind(&mut data, request.api_kind);
                Some(request.database)
            }
            Self::GetContainerThroughput(request) => {
                data.insert(
                    CONTAINER_DATA_FIELD.to_string(),
                    token_value(&request.snapshot)?,
                );
                insert_api_kind(&mut data, request.api_kind);
                Some(request.container)
            }
            Self::GetContainerMetrics(request) => {
                data.insert(
                    METRIC_TYPE_FIELD.to_string(),
                    Value::String(request.metric.as_str().to_string()),
                );
                insert_api_kind(&mut data, request.api_kind);
                data.insert(
                    SHARED_THROUGHPUT_FIELD.to_string(),
                    Value::Bool(request.shared_throughput),
                );
                Some(request.container)
            }
        };

        Ok(TaskEnvelope::new(
            kind.as_str(),
            rid.map(|address| address.build()),
            data,
        ))
    }
}

fn parse_rid(kind: TaskKind, rid: Option<&str>, level: AddressLevel) -> CoreResult<ResourceAddress> {
    let Some(rid) = rid else {
        return Err(CoreError::new(
            CoreErrorKind::MalformedAddress,
            "task requires a resource address but 'rid' is missing",
        )
        .with_task(kind));
    };

    let address = ResourceAddress::parse(rid).map_err(|error| error.with_task(kind))?;
    if address.level() != level {
        return Err(CoreError::new(
            CoreErrorKind::MalformedAddress,
            format!(
                "resource address '{rid}' is at {:?} level, expected {level:?}",
                address.level()
            ),
        )
        .with_task(kind));
    }
    Ok(address)
}

fn string_field(kind: TaskKind, data: &Map<String, Value>, field: &str) -> CoreResult<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid_data(kind, format!("task data field '{field}' must be a string")))
}

fn api_kind_field(kind: TaskKind, data: &Map<String, Value>) -> CoreResult<ApiKind> {
    string_field(kind, data, API_KIND_FIELD)?
        .parse::<ApiKind>()
        .map_err(|error| error.with_task(kind))
}

fn bool_field_or_false(kind: TaskKind, data: &Map<String, Value>, field: &str) -> CoreResult<bool> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(invalid_data(kind, format!("task data field '{field}' must be a boolean"))),
    }
}

fn token_field<T: crate::models::Snapshot>(
    kind: TaskKind,
    data: &Map<String, Value>,
    field: &str,
) -> CoreResult<T> {
    let token = ContinuationToken::new(string_field(kind, data, field)?);
    token.decode::<T>().map_err(|error| error.with_task(kind))
}

fn token_value<T: crate::models::Snapshot>(snapshot: &T) -> CoreResult<Value> {
    Ok(Value::String(ContinuationToken::encode(snapshot)?.into_string()))
}

fn insert_api_kind(data: &mut Map<String, Value>, api_kind: ApiKind) {
    data.insert(
        API_KIND_FIELD.to_string(),
        Value::String(api_kind.as_str().to_string()),
    );
}

fn invalid_data(kind: TaskKind, message: String) -> CoreError {
    CoreError::new(CoreErrorKind::InvalidInput, message).with_task(kind)
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{
        GetContainerMetricsRequest, ListDatabasesRequest, TaskEnvelope, TaskKind, TaskRequest,
        seed_envelope,
    };
    use crate::models::{ApiKind, CoreErrorKind, MetricKind, ResourceAddress};

    const CONTAINER: &str = "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/sqlDatabases/db1/containers/c1";
    const ACCOUNT: &str =
        "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1";

    #[test]
    fn seed_matches_wire_shape() {
        let message = seed_envelope().to_message().unwrap();
        assert_eq!(message, r#"{"task":"ListVisibleSubscriptions"}"#);
        assert_eq!(
            TaskRequest::from_envelope(&seed_envelope()).unwrap(),
            TaskRequest::ListVisibleSubscriptions
        );
    }

    #[test]
    fn null_task_data_is_treated_as_empty() {
        let envelope =
            TaskEnvelope::from_message(r#"{"task":"ListVisibleSubscriptions","taskData":null}"#)
                .unwrap();
        assert!(envelope.task_data().is_empty());
    }

    #[test]
    fn unknown_task_kind_is_unrecognized() {
        let envelope = TaskEnvelope::new("DeleteEverything", None, Map::new());
        let error = TaskRequest::from_envelope(&envelope).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::UnrecognizedTask);
        assert!(!error.is_retryable());
    }

    #[test]
    fn wire_names_parse_back_to_kinds() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.as_str().parse::<TaskKind>().unwrap(), kind);
        }
    }

    #[test]
    fn missing_required_field_is_invalid_input() {
        let envelope = TaskEnvelope::new(
            TaskKind::ListDatabases.as_str(),
            Some(ACCOUNT.to_string()),
            Map::new(),
        );
        let error = TaskRequest::from_envelope(&envelope).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
        assert_eq!(error.task, Some(TaskKind::ListDatabases));
        assert!(error.message.contains("APIKind"));
    }

    #[test]
    fn rid_at_wrong_level_is_malformed() {
        let mut data = Map::new();
        data.insert("APIKind".to_string(), json!("NoSQL"));
        let envelope = TaskEnvelope::new(
            TaskKind::ListDatabases.as_str(),
            Some(CONTAINER.to_string()),
            data,
        );
        let error = TaskRequest::from_envelope(&envelope).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::MalformedAddress);
    }

    #[test]
    fn ill_typed_shared_flag_is_rejected() {
        let envelope = TaskEnvelope::from_message(&format!(
            r#"{{"task":"GetCosmosContainerMetrics","rid":"{CONTAINER}","taskData":{{"metricType":"Requests","APIKind":"NoSQL","isSharedThroughput":"yes"}}}}"#
        ))
        .unwrap();
        let error = TaskRequest::from_envelope(&envelope).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }

    #[test]
    fn absent_shared_flag_defaults_to_dedicated() {
        let envelope = TaskEnvelope::from_message(&format!(
            r#"{{"task":"GetCosmosContainerMetrics","rid":"{CONTAINER}","taskData":{{"metricType":"Requests","APIKind":"Mongo"}}}}"#
        ))
        .unwrap();

        match TaskRequest::from_envelope(&envelope).unwrap() {
            TaskRequest::GetContainerMetrics(request) => {
                assert_eq!(request.metric, MetricKind::Requests);
                assert_eq!(request.api_kind, ApiKind::Mongo);
                assert!(!request.shared_throughput);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn typed_request_survives_the_wire() {
        let request = TaskRequest::GetContainerMetrics(GetContainerMetricsRequest {
            container: ResourceAddress::parse(CONTAINER).unwrap(),
            api_kind: ApiKind::Gremlin,
            metric: MetricKind::PartitionKeyUsage,
            shared_throughput: true,
        });

        let message = request.clone().into_envelope().unwrap().to_message().unwrap();
        let decoded = TaskRequest::from_envelope(&TaskEnvelope::from_message(&message).unwrap())
            .unwrap();
        assert_eq!(decoded, request);

        let wire: Value = serde_json::from_str(&message).unwrap();
        assert_eq!(wire["task"], "GetCosmosContainerMetrics");
        assert_eq!(wire["taskData"]["isSharedThroughput"], true);
        assert_eq!(wire["taskData"]["APIKind"], "Gremlin");
    }

    #[test]
    fn list_databases_envelope_carries_account_rid() {
        let envelope = TaskRequest::ListDatabases(ListDatabasesRequest {
            account: ResourceAddress::parse(ACCOUNT).unwrap(),
            api_kind: ApiKind::Table,
        })
        .into_envelope()
        .unwrap();

        assert_eq!(envelope.task(), "ListCosmosDatabases");
        assert_eq!(envelope.rid(), Some(ACCOUNT));
        assert_eq!(envelope.task_data()["APIKind"], "Table");
    }
}
