use crate::dialects::{CosmosDialect, is_default_indexing_policy};
use crate::models::{ApiKind, ContainerSnapshot};

#[derive(Clone, Copy, Debug, Default)]
pub struct NoSqlDialect;

impl CosmosDialect for NoSqlDialect {
    fn api_kind(&self) -> ApiKind {
        ApiKind::NoSql
    }

    fn database_kind(&self) -> &'static str {
        "sqlDatabases"
    }

    fn container_kind(&self) -> &'static str {
        "containers"
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

    use super::NoSqlDialect;
    use crate::dialects::CosmosDialect;
    use crate::providers::parse_resource_list;

    #[test]
    fn reads_policy_and_ttl_from_container_payload() {
        let body = json!({
            "value": [{
                "id": "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/sqlDatabases/db1/containers/c1",
                "name": "c1",
                "properties": {
                    "resource": {
                        "id": "c1",
                        "defaultTtl": 86400,
                        "indexingPolicy": {
                            "automatic": true,
                            "indexingMode": "consistent",
                            "includedPaths": [{"path": "/*"}],
                            "excludedPaths": [{"path": "/\"_etag\"/?"}]
                        }
                    }
                }
            }]
        })
        .to_string();

        let container = parse_resource_list(&body)
            .unwrap()
            .remove(0)
            .into_container_snapshot();

        assert!(NoSqlDialect.indexing_is_default(&container));
        assert_eq!(NoSqlDialect.container_ttl(&container), Some(86400));
    }

    #[test]
    fn composite_indexes_make_policy_custom() {
        let body = json!({
            "value": [{
                "id": "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/sqlDatabases/db1/containers/c1",
                "name": "c1",
                "properties": {
                    "resource": {
                        "id": "c1",
                        "indexingPolicy": {
                            "automatic": true,
                            "indexingMode": "consistent",
                            "includedPaths": [{"path": "/*"}],
                            "excludedPaths": [{"path": "/\"_etag\"/?"}],
                            "compositeIndexes": [[
                                {"path": "/customer", "order": "ascending"},
                                {"path": "/placedAt", "order": "descending"}
                            ]]
                        }
                    }
                }
            }]
        })
        .to_string();

        let container = parse_resource_list(&body)
            .unwrap()
            .remove(0)
            .into_container_snapshot();

        assert!(!NoSqlDialect.indexing_is_default(&container));
    }
}
