use crate::dialects::{CosmosDialect, is_default_indexing_policy};
use crate::models::{ApiKind, ContainerSnapshot};

#[derive(Clone, Copy, Debug, Default)]
pub struct GremlinDialect;

impl CosmosDialect for GremlinDialect {
    fn api_kind(&self) -> ApiKind {
        ApiKind::Gremlin
    }

    fn database_kind(&self) -> &'static str {
        "gremlinDatabases"
    }

    fn container_kind(&self) -> &'static str {
        "graphs"
    }

    fn indexing_is_default(&self, container: &ContainerSnapshot) -> bool {
        is_default_indexing_policy(container.indexing_policy.as_ref())
    }

    fn container_ttl(&self, container: &ContainerSnapshot) -> Option<i64> {
        container.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::GremlinDialect;
    use crate::dialects::CosmosDialect;
    use crate::models::{ContainerSnapshot, IndexingPolicy, ResourceAddress};

    #[test]
    fn lazy_indexing_is_not_default() {
        let graph = ContainerSnapshot {
            id: ResourceAddress::parse(
                "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/g1/gremlinDatabases/db1/graphs/people",
            )
            .unwrap(),
            name: "people".to_string(),
            indexing_policy: Some(IndexingPolicy {
                automatic: Some(true),
                indexing_mode: Some("lazy".to_string()),
                included_paths: vec!["/*".to_string()],
                excluded_paths: vec!["/\"_etag\"/?".to_string()],
                ..IndexingPolicy::default()
            }),
            indexes: Vec::new(),
            default_ttl: None,
            raw: json!({"name": "people"}),
        };

        assert!(!GremlinDialect.indexing_is_default(&graph));
        assert_eq!(GremlinDialect.container_ttl(&graph), None);
    }

    #[test]
    fn spatial_indexes_make_policy_custom() {
        let graph = ContainerSnapshot {
            id: ResourceAddress::parse(
                "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/g1/gremlinDatabases/db1/graphs/places",
            )
            .unwrap(),
            name: "places".to_string(),
            indexing_policy: Some(IndexingPolicy {
                automatic: Some(true),
                indexing_mode: Some("consistent".to_string()),
                included_paths: vec!["/*".to_string()],
                excluded_paths: vec!["/\"_etag\"/?".to_string()],
                spatial_indexes: vec![json!({"path": "/location/*", "types": ["Point"]})],
                ..IndexingPolicy::default()
            }),
            indexes: Vec::new(),
            default_ttl: None,
            raw: json!({"name": "places"}),
        };

        assert!(!GremlinDialect.indexing_is_default(&graph));
    }
}
