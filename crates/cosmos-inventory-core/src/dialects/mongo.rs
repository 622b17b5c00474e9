use crate::dialects::CosmosDialect;
use crate::models::{ApiKind, ContainerSnapshot};

const ID_KEY: &str = "_id";
const TIMESTAMP_KEY: &str = "_ts";

#[derive(Clone, Copy, Debug, Default)]
pub struct MongoDialect;

impl CosmosDialect for MongoDialect {
    fn api_kind(&self) -> ApiKind {
        ApiKind::Mongo
    }

    fn database_kind(&self) -> &'static str {
        "mongodbDatabases"
    }

    fn container_kind(&self) -> &'static str {
        "collections"
    }

    /// A fresh collection has exactly the `_id` index, with no options.
    fn indexing_is_default(&self, container: &ContainerSnapshot) -> bool {
        match container.indexes.as_slice() {
            [index] => index.keys == [ID_KEY] && index.options.is_empty(),
            _ => false,
        }
    }

    /// Collection TTL lives on the `_ts` index.
    fn container_ttl(&self, container: &ContainerSnapshot) -> Option<i64> {
        container
            .indexes
            .iter()
            .filter(|index| index.keys.iter().any(|key| key == TIMESTAMP_KEY))
            .filter_map(|index| index.expire_after_seconds)
            .last()
    }
}
