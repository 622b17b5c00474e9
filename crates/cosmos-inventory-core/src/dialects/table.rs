use serde_json::json;

use crate::dialects::{CosmosDialect, lookup_throughput};
use crate::models::{
    AddressLevel, AddressSegment, ApiKind, ContainerSnapshot, CoreError, CoreErrorKind,
    CoreResult, DatabaseSnapshot, ResourceAddress, ThroughputLookup,
};
use crate::providers::{ResourceProvider, parse_resource_list};

/// Every table account holds a single implicit database.
pub const TABLES_DATABASE_NAME: &str = "TablesDB";
pub const TABLES_DATABASE_KIND: &str = "dbs";
pub const TABLES_CONTAINER_KIND: &str = "colls";
/// ARM child type of tables, which sit directly under the account.
pub const TABLES_RESOURCE_KIND: &str = "tables";

#[derive(Clone, Copy, Debug, Default)]
pub struct TableDialect;

impl TableDialect {
    fn placeholder_segment() -> AddressSegment {
        AddressSegment::new(TABLES_DATABASE_KIND, TABLES_DATABASE_NAME)
    }

    fn ensure_placeholder(database: &ResourceAddress) -> CoreResult<()> {
        if database.kind() == TABLES_DATABASE_KIND && database.name() == TABLES_DATABASE_NAME {
            return Ok(());
        }
        Err(CoreError::new(
            CoreErrorKind::InvalidInput,
            format!(
                "table accounts only have the '{TABLES_DATABASE_KIND}/{TABLES_DATABASE_NAME}' database, got '{database}'"
            ),
        )
        .with_api_kind(ApiKind::Table))
    }
}

impl CosmosDialect for TableDialect {
    fn api_kind(&self) -> ApiKind {
        ApiKind::Table
    }

    fn database_kind(&self) -> &'static str {
        TABLES_DATABASE_KIND
    }

    fn container_kind(&self) -> &'static str {
        TABLES_CONTAINER_KIND
    }

    fn list_databases(
        &self,
        _provider: &dyn ResourceProvider,
        account: &ResourceAddress,
    ) -> CoreResult<Vec<DatabaseSnapshot>> {
        let id = account.with_child(TABLES_DATABASE_KIND, TABLES_DATABASE_NAME)?;
        let raw = json!({ "id": id.build(), "name": TABLES_DATABASE_NAME });
        Ok(vec![DatabaseSnapshot {
            id,
            name: TABLES_DATABASE_NAME.to_string(),
            raw,
        }])
    }

    /// Table accounts have no database-level offers.
    fn database_throughput(
        &self,
        _provider: &dyn ResourceProvider,
        database: &ResourceAddress,
    ) -> CoreResult<ThroughputLookup> {
        Self::ensure_placeholder(database)?;
        Ok(ThroughputLookup::InheritedAbsence)
    }

    fn list_containers(
        &self,
        provider: &dyn ResourceProvider,
        database: &ResourceAddress,
    ) -> CoreResult<Vec<ContainerSnapshot>> {
        Self::ensure_placeholder(database)?;
        let account = database.ancestor(AddressLevel::Account)?;
        let body = provider.list_children(&account, TABLES_RESOURCE_KIND)?;

        parse_resource_list(&body)?
            .into_iter()
            .map(|mut resource| -> CoreResult<ContainerSnapshot> {
                resource.id = resource
                    .id
                    .reparent(&Self::placeholder_segment(), TABLES_CONTAINER_KIND)?;
                Ok(resource.into_container_snapshot())
            })
            .collect()
    }

    fn container_throughput(
        &self,
        provider: &dyn ResourceProvider,
        container: &ResourceAddress,
    ) -> CoreResult<ThroughputLookup> {
        let database = container.ancestor(AddressLevel::Database)?;
        Self::ensure_placeholder(&database)?;
        let table = container
            .ancestor(AddressLevel::Account)?
            .with_child(TABLES_RESOURCE_KIND, container.name())?;
        lookup_throughput(provider, &table)
    }

    // The resource provider reports no indexing settings for tables.
    fn indexing_is_default(&self, _container: &ContainerSnapshot) -> bool {
        true
    }

    fn container_ttl(&self, _container: &ContainerSnapshot) -> Option<i64> {
        None
    }
}
