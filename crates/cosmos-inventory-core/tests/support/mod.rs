#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cosmos_inventory_core::config::{StreamTarget, WorkerConfig};
use cosmos_inventory_core::context::{FixedClock, WorkerContext};
use cosmos_inventory_core::models::{
    CoreError, CoreResult, Metric, MetricValue, MetricsQuery, MetricsResponse, ResourceAddress,
    TaskEnvelope, TaskKind, TimeSeriesElement,
};
use cosmos_inventory_core::providers::{
    ClientFactory, MetricsProvider, ProviderError, ProviderResult, ResourceProvider,
    SubscriptionDirectory, TelemetrySink,
};
use cosmos_inventory_core::router::TaskRouter;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;

pub const SUBSCRIPTIONS: &str = include_str!("../fixtures/arm/subscriptions.json");
pub const ACCOUNTS_NOSQL: &str = include_str!("../fixtures/arm/accounts_nosql.json");
pub const ACCOUNTS_SERVERLESS: &str = include_str!("../fixtures/arm/accounts_serverless.json");
pub const ACCOUNTS_TABLE: &str = include_str!("../fixtures/arm/accounts_table.json");
pub const SERVICES_EMPTY: &str = include_str!("../fixtures/arm/services_empty.json");
pub const SERVICES_GATEWAY: &str = include_str!("../fixtures/arm/services_gateway.json");
pub const SQL_DATABASES: &str = include_str!("../fixtures/arm/sql_databases.json");
pub const SQL_CONTAINERS: &str = include_str!("../fixtures/arm/sql_containers.json");
pub const TABLES: &str = include_str!("../fixtures/arm/tables.json");
pub const THROUGHPUT_MANUAL_400: &str = include_str!("../fixtures/arm/throughput_manual_400.json");
pub const THROUGHPUT_AUTOSCALE_4000: &str =
    include_str!("../fixtures/arm/throughput_autoscale_4000.json");

pub const ACCOUNT: &str =
    "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1";
pub const DATABASE: &str = "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/sqlDatabases/db1";
pub const CONTAINER: &str = "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/sqlDatabases/db1/containers/c1";

pub const NOW: OffsetDateTime = datetime!(2024-05-02 08:30:00 UTC);

/// ARM responses keyed by request path, shared across subscriptions.
#[derive(Default)]
pub struct FakeArm {
    routes: Mutex<HashMap<String, ProviderResult<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeArm {
    pub fn route(&self, path: impl Into<String>, response: ProviderResult<String>) -> &Self {
        self.routes.lock().unwrap().insert(path.into(), response);
        self
    }

    pub fn ok(&self, path: impl Into<String>, body: &str) -> &Self {
        self.route(path, Ok(body.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, path: String) -> ProviderResult<String> {
        self.calls.lock().unwrap().push(path.clone());
        self.routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or(Err(ProviderError::NotFound { message: path }))
    }
}

pub fn accounts_path(subscription_id: &str) -> String {
    format!("/subscriptions/{subscription_id}/providers/Microsoft.DocumentDB/databaseAccounts")
}

pub fn services_path(account: &str) -> String {
    format!("{account}/services")
}

pub fn children_path(parent: &str, child_kind: &str) -> String {
    format!("{parent}/{child_kind}")
}

pub fn throughput_path(resource: &str) -> String {
    format!("{resource}/throughputSettings/default")
}

struct SubscriptionScopedProvider {
    subscription_id: String,
    arm: Arc<FakeArm>,
}

impl ResourceProvider for SubscriptionScopedProvider {
    fn list_database_accounts(&self) -> ProviderResult<String> {
        self.arm.answer(accounts_path(&self.subscription_id))
    }

    fn list_account_services(&self, account: &ResourceAddress) -> ProviderResult<String> {
        self.arm.answer(services_path(&account.build()))
    }

    fn list_children(&self, parent: &ResourceAddress, child_kind: &str) -> ProviderResult<String> {
        self.arm.answer(children_path(&parent.build(), child_kind))
    }

    fn get_throughput_settings(&self, resource: &ResourceAddress) -> ProviderResult<String> {
        self.arm.answer(throughput_path(&resource.build()))
    }
}

pub struct FakeDirectory {
    pub response: ProviderResult<String>,
}

impl SubscriptionDirectory for FakeDirectory {
    fn list_subscriptions(&self) -> ProviderResult<String> {
        self.response.clone()
    }
}

/// Answers every query with one series per requested metric, carrying all
/// the dimensions the handlers read.
#[derive(Default)]
pub struct FakeMetrics {
    queries: Mutex<Vec<MetricsQuery>>,
}

impl FakeMetrics {
    pub fn queries(&self) -> Vec<MetricsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl MetricsProvider for FakeMetrics {
    fn query_resource(&self, query: &MetricsQuery) -> ProviderResult<MetricsResponse> {
        self.queries.lock().unwrap().push(query.clone());
        let metadata_values = BTreeMap::from([
            ("operationtype".to_string(), "Query".to_string()),
            ("region".to_string(), "West US".to_string()),
            ("statuscode".to_string(), "200".to_string()),
            ("partitionkeyrangeid".to_string(), "0".to_string()),
            ("physicalpartitionid".to_string(), "p0".to_string()),
        ]);
        let metrics = query
            .metric_names
            .iter()
            .map(|name| Metric {
                name: name.clone(),
                timeseries: vec![TimeSeriesElement {
                    metadata_values: metadata_values.clone(),
                    data: vec![MetricValue {
                        timestamp: query.window.start,
                        count: Some(3.0),
                        maximum: Some(400.0),
                        total: Some(1024.0),
                    }],
                }],
            })
            .collect();
        Ok(MetricsResponse { metrics })
    }
}

/// Records uploads; the first `failures` uploads are rejected.
#[derive(Default)]
pub struct RecordingSink {
    uploads: Mutex<Vec<(StreamTarget, Vec<Value>)>>,
    failures: AtomicUsize,
}

impl RecordingSink {
    pub fn failing(failures: usize) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn uploads(&self) -> Vec<(StreamTarget, Vec<Value>)> {
        self.uploads.lock().unwrap().clone()
    }

    /// Uploaded rows whose stream name mentions `suffix`.
    pub fn rows_for(&self, suffix: &str) -> Vec<Value> {
        self.uploads()
            .into_iter()
            .filter(|(target, _)| target.stream_name.contains(suffix))
            .flat_map(|(_, rows)| rows)
            .collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn upload(&self, target: &StreamTarget, rows: &[Value]) -> ProviderResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Http {
                status: 503,
                message: "ingestion unavailable".to_string(),
            });
        }
        self.uploads
            .lock()
            .unwrap()
            .push((target.clone(), rows.to_vec()));
        Ok(())
    }
}

pub struct FakeFactory {
    pub directory: Arc<FakeDirectory>,
    pub arm: Arc<FakeArm>,
    pub metrics: Arc<FakeMetrics>,
    pub sink: Arc<dyn TelemetrySink>,
    pub resource_provider_builds: AtomicUsize,
}

impl FakeFactory {
    pub fn new(arm: Arc<FakeArm>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            directory: Arc::new(FakeDirectory {
                response: Ok(SUBSCRIPTIONS.to_string()),
            }),
            arm,
            metrics: Arc::new(FakeMetrics::default()),
            sink,
            resource_provider_builds: AtomicUsize::new(0),
        }
    }
}

impl ClientFactory for FakeFactory {
    fn subscription_directory(&self) -> CoreResult<Arc<dyn SubscriptionDirectory>> {
        Ok(self.directory.clone())
    }

    fn resource_provider(&self, subscription_id: &str) -> CoreResult<Arc<dyn ResourceProvider>> {
        self.resource_provider_builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(SubscriptionScopedProvider {
            subscription_id: subscription_id.to_string(),
            arm: self.arm.clone(),
        }))
    }

    fn metrics_provider(&self) -> CoreResult<Arc<dyn MetricsProvider>> {
        Ok(self.metrics.clone())
    }

    fn telemetry_sink(&self, _endpoint: &str) -> CoreResult<Arc<dyn TelemetrySink>> {
        Ok(self.sink.clone())
    }
}

pub fn test_config() -> WorkerConfig {
    WorkerConfig::from_lookup(|name| Some(format!("{name}-value")))
        .expect("every variable is provided")
}

pub fn router_for(factory: Arc<FakeFactory>) -> TaskRouter {
    let context = WorkerContext::new(factory, test_config()).with_clock(Arc::new(FixedClock(NOW)));
    TaskRouter::new(Arc::new(context))
}

/// ARM tree of one NoSQL account `acct1` with `db1/c1`, container offer
/// 400 RU/s and no database offer.
pub fn nosql_arm() -> Arc<FakeArm> {
    let arm = Arc::new(FakeArm::default());
    arm.ok(accounts_path("S1"), ACCOUNTS_NOSQL)
        .ok(services_path(ACCOUNT), SERVICES_EMPTY)
        .ok(children_path(ACCOUNT, "sqlDatabases"), SQL_DATABASES)
        .ok(children_path(DATABASE, "containers"), SQL_CONTAINERS)
        .ok(throughput_path(CONTAINER), THROUGHPUT_MANUAL_400);
    arm
}

/// Runs every envelope reachable from `seed` on the calling thread.
/// Returns the envelopes that completed and the ones that failed.
pub fn crawl_sync(
    router: &TaskRouter,
    seed: TaskEnvelope,
) -> (Vec<TaskEnvelope>, Vec<(TaskEnvelope, CoreError)>) {
    let mut pending = VecDeque::from([seed]);
    let mut completed = Vec::new();
    let mut failed = Vec::new();
    while let Some(envelope) = pending.pop_front() {
        match router.execute(&envelope) {
            Ok(follow_ups) => {
                pending.extend(follow_ups);
                completed.push(envelope);
            }
            Err(error) => failed.push((envelope, error)),
        }
    }
    (completed, failed)
}

pub fn first_of(envelopes: &[TaskEnvelope], kind: TaskKind) -> TaskEnvelope {
    envelopes
        .iter()
        .find(|envelope| envelope.task() == kind.as_str())
        .cloned()
        .unwrap_or_else(|| panic!("no {} envelope was produced", kind.as_str()))
}
