use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{ApiKind, CapacityMode, ResourceAddress};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Account,
    Database,
    Container,
}

/// Resource metadata that travels between stages inside a continuation token.
pub trait Snapshot: Serialize + DeserializeOwned {
    const KIND: SnapshotKind;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: ResourceAddress,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Full provider representation, reported as additional data.
    pub raw: Value,
}

impl AccountSnapshot {
    pub fn api_kind(&self) -> ApiKind {
        ApiKind::from_capabilities(self.capabilities.iter().map(String::as_str))
    }

    pub fn capacity_mode(&self) -> CapacityMode {
        CapacityMode::from_capabilities(self.capabilities.iter().map(String::as_str))
    }
}

impl Snapshot for AccountSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Account;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub id: ResourceAddress,
    pub name: String,
    pub raw: Value,
}

impl Snapshot for DatabaseSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Database;
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct IndexingPolicy {
    pub automatic: Option<bool>,
    pub indexing_mode: Option<String>,
    #[serde(default)]
    pub included_paths: Vec<String>,
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub composite_indexes: Vec<Value>,
    #[serde(default)]
    pub spatial_indexes: Vec<Value>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MongoIndex {
    pub keys: Vec<String>,
    #[serde(default)]
    pub expire_after_seconds: Option<i64>,
    /// Every non-null index option, `expireAfterSeconds` included.
    #[serde(default)]
    pub options: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub id: ResourceAddress,
    pub name: String,
    #[serde(default)]
    pub indexing_policy: Option<IndexingPolicy>,
    #[serde(default)]
    pub indexes: Vec<MongoIndex>,
    #[serde(default)]
    pub default_ttl: Option<i64>,
    pub raw: Value,
}

impl Snapshot for ContainerSnapshot {
    const KIND: SnapshotKind = SnapshotKind::Container;
}
