use serde_json::Value;

use crate::models::{
    AccountSnapshot, AutoscaleSettings, ContainerSnapshot, CoreError, CoreErrorKind, CoreResult,
    DatabaseSnapshot, IndexingPolicy, MongoIndex, ResourceAddress, ThroughputOffer,
};

#[derive(Clone, Debug, PartialEq)]
pub struct VisibleSubscription {
    pub address: ResourceAddress,
    pub display_name: String,
}

/// One element of an ARM list response.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmResource {
    pub id: ResourceAddress,
    pub name: String,
    pub raw: Value,
}

impl ArmResource {
    pub fn into_database_snapshot(self) -> DatabaseSnapshot {
        DatabaseSnapshot {
            id: self.id,
            name: self.name,
            raw: self.raw,
        }
    }

    /// Reads the container fields every dialect might need. Which ones are
    /// meaningful is up to the dialect.
    pub fn into_container_snapshot(self) -> ContainerSnapshot {
        let resource = self.raw.pointer("/properties/resource");
        let indexing_policy = resource
            .and_then(|resource| resource.get("indexingPolicy"))
            .map(parse_indexing_policy);
        let indexes = resource
            .and_then(|resource| resource.get("indexes"))
            .and_then(Value::as_array)
            .map(|indexes| indexes.iter().map(parse_mongo_index).collect())
            .unwrap_or_default();
        let default_ttl = resource
            .and_then(|resource| resource.get("defaultTtl"))
            .and_then(Value::as_i64);

        ContainerSnapshot {
            id: self.id,
            name: self.name,
            indexing_policy,
            indexes,
            default_ttl,
            raw: self.raw,
        }
    }
}

pub fn parse_subscriptions(body: &str) -> CoreResult<Vec<VisibleSubscription>> {
    let mut subscriptions = Vec::new();
    for entry in list_values(body, "subscription list")? {
        let Some(subscription_id) = entry
            .get("subscriptionId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Err(parse_error("subscription entry has no 'subscriptionId'"));
        };
        let display_name = entry
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(subscription_id)
            .to_string();

        subscriptions.push(VisibleSubscription {
            address: ResourceAddress::subscription(subscription_id)?,
            display_name,
        });
    }
    Ok(subscriptions)
}

pub fn parse_accounts(body: &str) -> CoreResult<Vec<AccountSnapshot>> {
    let mut accounts = Vec::new();
    for entry in list_values(body, "database account list")? {
        let resource = parse_arm_resource(&entry)?;
        let location = entry
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string);
        let capabilities = entry
            .pointer("/properties/capabilities")
            .and_then(Value::as_array)
            .map(|capabilities| {
                capabilities
                    .iter()
                    .filter_map(|capability| capability.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        accounts.push(AccountSnapshot {
            id: resource.id,
            name: resource.name,
            location,
            capabilities,
            raw: resource.raw,
        });
    }
    Ok(accounts)
}

/// Returns the first service listed for an account, if any.
pub fn parse_first_service(body: &str) -> CoreResult<Option<Value>> {
    Ok(list_values(body, "account service list")?.first().cloned())
}

pub fn parse_resource_list(body: &str) -> CoreResult<Vec<ArmResource>> {
    list_values(body, "resource list")?
        .iter()
        .map(parse_arm_resource)
        .collect()
}

pub fn parse_throughput_settings(body: &str) -> CoreResult<ThroughputOffer> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| parse_error(&format!("invalid throughput settings JSON: {e}")))?;
    let Some(resource) = json.pointer("/properties/resource") else {
        return Err(parse_error(
            "throughput settings have no 'properties.resource' object",
        ));
    };

    let throughput = resource.get("throughput").and_then(Value::as_i64);
    let autoscale_settings = resource
        .get("autoscaleSettings")
        .filter(|settings| !settings.is_null())
        .map(|settings| AutoscaleSettings {
            max_throughput: settings.get("maxThroughput").and_then(Value::as_i64),
        });

    Ok(ThroughputOffer {
        throughput,
        autoscale_settings,
    })
}

fn list_values(body: &str, what: &str) -> CoreResult<Vec<Value>> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| parse_error(&format!("invalid {what} JSON: {e}")))?;
    match json.get("value") {
        Some(Value::Array(values)) => Ok(values.clone()),
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(_) => Err(parse_error(&format!("{what} 'value' is not an array"))),
    }
}

fn parse_arm_resource(entry: &Value) -> CoreResult<ArmResource> {
    let Some(id) = entry.get("id").and_then(Value::as_str) else {
        return Err(parse_error("resource entry has no 'id'"));
    };
    let id = ResourceAddress::parse(id)?;
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| id.name().to_string());

    Ok(ArmResource {
        id,
        name,
        raw: entry.clone(),
    })
}

fn parse_indexing_policy(policy: &Value) -> IndexingPolicy {
    let paths = |field: &str| -> Vec<String> {
        policy
            .get(field)
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(|path| path.get("path").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let entries = |field: &str| -> Vec<Value> {
        policy
            .get(field)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    IndexingPolicy {
        automatic: policy.get("automatic").and_then(Value::as_bool),
        indexing_mode: policy
            .get("indexingMode")
            .and_then(Value::as_str)
            .map(str::to_string),
        included_paths: paths("includedPaths"),
        excluded_paths: paths("excludedPaths"),
        composite_indexes: entries("compositeIndexes"),
        spatial_indexes: entries("spatialIndexes"),
    }
}

fn parse_mongo_index(index: &Value) -> MongoIndex {
    let options = index
        .get("options")
        .and_then(Value::as_object)
        .map(|options| {
            options
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    MongoIndex {
        keys: index
            .pointer("/key/keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        expire_after_seconds: index
            .pointer("/options/expireAfterSeconds")
            .and_then(Value::as_i64),
        options,
    }
}

fn parse_error(message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::ParseFailure, message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        parse_accounts, parse_first_service, parse_resource_list, parse_subscriptions,
        parse_throughput_settings,
    };
    use crate::models::{ApiKind, CapacityMode, CoreErrorKind};

    #[test]
    fn subscriptions_keep_display_names() {
        let body = r#"{"value":[{"id":"/subscriptions/S1","subscriptionId":"S1","displayName":"Contoso"}]}"#;
        let subscriptions = parse_subscriptions(body).unwrap();

        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].address.build(), "/subscriptions/S1");
        assert_eq!(subscriptions[0].display_name, "Contoso");
    }

    #[test]
    fn missing_value_array_is_an_empty_listing() {
        assert!(parse_resource_list("{}").unwrap().is_empty());
        assert!(parse_first_service(r#"{"value":[]}"#).unwrap().is_none());
    }

    #[test]
    fn accounts_carry_capabilities() {
        let body = json!({
            "value": [{
                "id": "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1",
                "name": "acct1",
                "location": "West US",
                "properties": {
                    "capabilities": [{"name": "EnableMongo"}, {"name": "EnableServerless"}]
                }
            }]
        })
        .to_string();

        let accounts = parse_accounts(&body).unwrap();
        assert_eq!(accounts[0].name, "acct1");
        assert_eq!(accounts[0].location.as_deref(), Some("West US"));
        assert_eq!(accounts[0].api_kind(), ApiKind::Mongo);
        assert_eq!(accounts[0].capacity_mode(), CapacityMode::Serverless);
    }

    #[test]
    fn container_fields_are_lifted_from_resource() {
        let body = json!({
            "value": [{
                "id": "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/acct1/mongodbDatabases/db1/collections/orders",
                "name": "orders",
                "properties": {
                    "resource": {
                        "id": "orders",
                        "indexes": [
                            {"key": {"keys": ["_id"]}},
                            {"key": {"keys": ["_ts"]}, "options": {"expireAfterSeconds": 600}}
                        ]
                    }
                }
            }]
        })
        .to_string();

        let container = parse_resource_list(&body)
            .unwrap()
            .remove(0)
            .into_container_snapshot();
        assert_eq!(container.indexes.len(), 2);
        assert_eq!(container.indexes[1].expire_after_seconds, Some(600));
        assert_eq!(container.indexing_policy, None);
        assert_eq!(container.default_ttl, None);
    }

    #[test]
    fn indexing_policy_keeps_composite_and_spatial_indexes() {
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
                                {"path": "/name", "order": "ascending"},
                                {"path": "/age", "order": "descending"}
                            ]],
                            "spatialIndexes": []
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
        let policy = container.indexing_policy.unwrap();
        assert_eq!(policy.composite_indexes.len(), 1);
        assert!(policy.spatial_indexes.is_empty());
    }

    #[test]
    fn mongo_index_options_drop_nulls() {
        let body = json!({
            "value": [{
                "id": "/subscriptions/S1/resourceGroups/rg/providers/Microsoft.DocumentDB/databaseAccounts/m1/mongodbDatabases/db1/collections/orders",
                "name": "orders",
                "properties": {
                    "resource": {
                        "id": "orders",
                        "indexes": [
                            {"key": {"keys": ["_id"]}, "options": {"unique": true, "expireAfterSeconds": null}}
                        ]
                    }
                }
            }]
        })
        .to_string();

        let container = parse_resource_list(&body)
            .unwrap()
            .remove(0)
            .into_container_snapshot();
        assert_eq!(container.indexes[0].options.len(), 1);
        assert_eq!(container.indexes[0].options["unique"], true);
        assert_eq!(container.indexes[0].expire_after_seconds, None);
    }

    #[test]
    fn throughput_settings_distinguish_autoscale() {
        let manual = parse_throughput_settings(
            r#"{"properties":{"resource":{"throughput":400}}}"#,
        )
        .unwrap();
        let autoscale = parse_throughput_settings(
            r#"{"properties":{"resource":{"throughput":400,"autoscaleSettings":{"maxThroughput":4000}}}}"#,
        )
        .unwrap();

        assert_eq!(manual.throughput, Some(400));
        assert!(manual.autoscale_settings.is_none());
        assert_eq!(
            autoscale.autoscale_settings.and_then(|settings| settings.max_throughput),
            Some(4000)
        );
    }

    #[test]
    fn parse_errors_are_structured() {
        let error = parse_resource_list("not json").unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ParseFailure);

        let error = parse_resource_list(r#"{"value":[{"name":"x"}]}"#).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ParseFailure);
    }
}
