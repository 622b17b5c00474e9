pub mod cassandra;
pub mod gremlin;
pub mod mongo;
pub mod nosql;
pub mod table;

use crate::models::{
    ApiKind, ContainerSnapshot, CoreResult, DatabaseSnapshot, IndexingPolicy, ResourceAddress,
    ThroughputLookup,
};
use crate::providers::{
    ResourceProvider, parse_resource_list, parse_throughput_settings,
};

pub use cassandra::CassandraDialect;
pub use gremlin::GremlinDialect;
pub use mongo::MongoDialect;
pub use nosql::NoSqlDialect;
pub use table::TableDialect;

/// Per-API behavior behind the crawl. Dialects that follow the usual
/// account → database → container layout only name their child types; the
/// default methods do the rest.
pub trait CosmosDialect: Send + Sync {
    fn api_kind(&self) -> ApiKind;

    /// ARM child type of databases under an account, e.g. `sqlDatabases`.
    fn database_kind(&self) -> &'static str;

    /// ARM child type of containers under a database, e.g. `containers`.
    fn container_kind(&self) -> &'static str;

    fn list_databases(
        &self,
        provider: &dyn ResourceProvider,
        account: &ResourceAddress,
    ) -> CoreResult<Vec<DatabaseSnapshot>> {
        let body = provider.list_children(account, self.database_kind())?;
        Ok(parse_resource_list(&body)?
            .into_iter()
            .map(|resource| resource.into_database_snapshot())
            .collect())
    }

    fn database_throughput(
        &self,
        provider: &dyn ResourceProvider,
        database: &ResourceAddress,
    ) -> CoreResult<ThroughputLookup> {
        lookup_throughput(provider, database)
    }

    fn list_containers(
        &self,
        provider: &dyn ResourceProvider,
        database: &ResourceAddress,
    ) -> CoreResult<Vec<ContainerSnapshot>> {
        let body = provider.list_children(database, self.container_kind())?;
        Ok(parse_resource_list(&body)?
            .into_iter()
            .map(|resource| resource.into_container_snapshot())
            .collect())
    }

    fn container_throughput(
        &self,
        provider: &dyn ResourceProvider,
        container: &ResourceAddress,
    ) -> CoreResult<ThroughputLookup> {
        lookup_throughput(provider, container)
    }

    fn indexing_is_default(&self, container: &ContainerSnapshot) -> bool;

    fn container_ttl(&self, container: &ContainerSnapshot) -> Option<i64>;
}

static NOSQL: NoSqlDialect = NoSqlDialect;
static MONGO: MongoDialect = MongoDialect;
static CASSANDRA: CassandraDialect = CassandraDialect;
static TABLE: TableDialect = TableDialect;
static GREMLIN: GremlinDialect = GremlinDialect;

pub fn dialect_for(api_kind: ApiKind) -> &'static dyn CosmosDialect {
    match api_kind {
        ApiKind::NoSql => &NOSQL,
        ApiKind::Mongo => &MONGO,
        ApiKind::Cassandra => &CASSANDRA,
        ApiKind::Table => &TABLE,
        ApiKind::Gremlin => &GREMLIN,
    }
}

/// Reads a resource's own offer. Missing offers and the serverless rejection
/// are outcomes, not errors; anything else from the provider is.
pub fn lookup_throughput(
    provider: &dyn ResourceProvider,
    resource: &ResourceAddress,
) -> CoreResult<ThroughputLookup> {
    match provider.get_throughput_settings(resource) {
        Ok(body) => Ok(ThroughputLookup::Found(parse_throughput_settings(&body)?)),
        Err(error) if error.is_not_found() => Ok(ThroughputLookup::InheritedAbsence),
        Err(error) if error.is_serverless_signal() => Ok(ThroughputLookup::ServerlessAbsence),
        Err(error) => Err(error.into()),
    }
}

pub(crate) const DEFAULT_INCLUDED_PATH: &str = "/*";
pub(crate) const DEFAULT_EXCLUDED_PATH: &str = "/\"_etag\"/?";

/// Matches the policy a new NoSQL or Gremlin container is created with.
pub(crate) fn is_default_indexing_policy(policy: Option<&IndexingPolicy>) -> bool {
    let Some(policy) = policy else {
        return false;
    };
    policy.automatic == Some(true)
        && policy
            .indexing_mode
            .as_deref()
            .is_some_and(|mode| mode.eq_ignore_ascii_case("consistent"))
        && policy.included_paths == [DEFAULT_INCLUDED_PATH]
        && policy.excluded_paths == [DEFAULT_EXCLUDED_PATH]
        && policy.composite_indexes.is_empty()
        && policy.spatial_indexes.is_empty()
}
