use crate::dialects::CosmosDialect;
use crate::models::{ApiKind, ContainerSnapshot};

#[derive(Clone, Copy, Debug, Default)]
pub struct CassandraDialect;

impl CosmosDialect for CassandraDialect {
    fn api_kind(&self) -> ApiKind {
        ApiKind::Cassandra
    }

    fn database_kind(&self) -> &'static str {
        "cassandraKeyspaces"
    }

    fn container_kind(&self) -> &'static str {
        "tables"
    }

    // The resource provider reports no indexing settings for tables.
    fn indexing_is_default(&self, _container: &ContainerSnapshot) -> bool {
        true
    }

    fn container_ttl(&self, _container: &ContainerSnapshot) -> Option<i64> {
        None
    }
}
