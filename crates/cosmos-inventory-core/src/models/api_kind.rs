use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind};

/// Backend dialect of a database account. Assigned once when the account is
/// discovered and carried unchanged by every descendant task.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ApiKind {
    #[serde(rename = "NoSQL")]
    NoSql,
    Mongo,
    Cassandra,
    Table,
    Gremlin,
}

const CAPABILITY_API_KINDS: [(&str, ApiKind); 4] = [
    ("EnableMongo", ApiKind::Mongo),
    ("EnableCassandra", ApiKind::Cassandra),
    ("EnableTable", ApiKind::Table),
    ("EnableGremlin", ApiKind::Gremlin),
];

const SERVERLESS_CAPABILITY: &str = "EnableServerless";

impl ApiKind {
    pub const ALL: [ApiKind; 5] = [
        ApiKind::NoSql,
        ApiKind::Mongo,
        ApiKind::Cassandra,
        ApiKind::Table,
        ApiKind::Gremlin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSql => "NoSQL",
            Self::Mongo => "Mongo",
            Self::Cassandra => "Cassandra",
            Self::Table => "Table",
            Self::Gremlin => "Gremlin",
        }
    }

    /// Accounts without a dialect capability speak the NoSQL API.
    pub fn from_capabilities<'a>(capabilities: impl IntoIterator<Item = &'a str>) -> Self {
        let capabilities: Vec<&str> = capabilities.into_iter().collect();
        CAPABILITY_API_KINDS
            .iter()
            .find(|(capability, _)| capabilities.contains(capability))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::NoSql)
    }
}

impl FromStr for ApiKind {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorKind::InvalidInput,
                    format!("unknown API kind '{value}'"),
                )
            })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CapacityMode {
    Serverless,
    #[serde(rename = "Provisioned throughput")]
    ProvisionedThroughput,
}

impl CapacityMode {
    pub fn from_capabilities<'a>(capabilities: impl IntoIterator<Item = &'a str>) -> Self {
        if capabilities
            .into_iter()
            .any(|capability| capability == SERVERLESS_CAPABILITY)
        {
            Self::Serverless
        } else {
            Self::ProvisionedThroughput
        }
    }
}
