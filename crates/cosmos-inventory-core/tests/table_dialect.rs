mod support;

use std::sync::Arc;

use cosmos_inventory_core::models::{TaskKind, seed_envelope};
use serde_json::Value;

use support::{
    ACCOUNTS_TABLE, FakeArm, FakeFactory, RecordingSink, SERVICES_EMPTY, TABLES,
    THROUGHPUT_MANUAL_400, accounts_path, children_path, crawl_sync, router_for, services_path,
    throughput_path,
};

const TABLE_ACCOUNT: &str =
    "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/tbl1";
const REMAPPED_TABLE: &str = "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/tbl1/dbs/TablesDB/colls/orders";
const ARM_TABLE: &str = "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/tbl1/tables/orders";

fn table_arm() -> Arc<FakeArm> {
    let arm = Arc::new(FakeArm::default());
    arm.ok(accounts_path("S1"), ACCOUNTS_TABLE)
        .ok(services_path(TABLE_ACCOUNT), SERVICES_EMPTY)
        .ok(children_path(TABLE_ACCOUNT, "tables"), TABLES)
        .ok(throughput_path(ARM_TABLE), THROUGHPUT_MANUAL_400);
    arm
}

#[test]
fn tables_live_under_the_placeholder_database() {
    let arm = table_arm();
    let sink = Arc::new(RecordingSink::default());
    let factory = Arc::new(FakeFactory::new(arm.clone(), sink.clone()));

    let (completed, failed) = crawl_sync(&router_for(factory.clone()), seed_envelope());

    assert!(failed.is_empty(), "{failed:?}");

    let database = &sink.rows_for("DatabasesConfig")[0];
    assert_eq!(database["DatabaseName"], "TablesDB");
    assert_eq!(database["DatabaseThroughputMode"], "Dedicated");
    assert_eq!(database["DatabaseThroughputType"], Value::Null);

    let container = &sink.rows_for("ContainersConfig")[0];
    assert_eq!(container["DatabaseName"], "TablesDB");
    assert_eq!(container["ContainerName"], "orders");
    assert_eq!(container["ContainerThroughputMode"], "Dedicated");
    assert_eq!(container["ContainerThroughput"], 400);
    assert_eq!(container["ContainerIndexingIsDefault"], true);
    assert_eq!(container["ContainerTTL"], Value::Null);

    let container_task = completed
        .iter()
        .find(|envelope| envelope.task() == TaskKind::GetContainerThroughput.as_str())
        .unwrap();
    assert_eq!(container_task.rid(), Some(REMAPPED_TABLE));
    assert!(
        completed
            .iter()
            .filter(|envelope| envelope.task() == TaskKind::GetContainerMetrics.as_str())
            .all(|envelope| envelope.rid() == Some(REMAPPED_TABLE))
    );

    let calls = arm.calls();
    assert!(calls.contains(&throughput_path(ARM_TABLE)));
    assert!(
        !calls
            .iter()
            .any(|call| call.contains("/dbs/TablesDB") && call.ends_with("throughputSettings/default")),
        "offer reads go to the ARM table address: {calls:?}"
    );
    assert!(
        !calls.iter().any(|call| call.ends_with("/dbs")),
        "the placeholder database is never listed: {calls:?}"
    );

    let filters: Vec<String> = factory
        .metrics
        .queries()
        .into_iter()
        .map(|query| query.filter)
        .collect();
    assert!(
        filters
            .iter()
            .all(|filter| filter.starts_with("DatabaseName eq 'TablesDB'"))
    );
}
