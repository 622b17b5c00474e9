use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ThroughputMode {
    Dedicated,
    Shared,
    Serverless,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ThroughputType {
    Manual,
    Autoscale,
    Serverless,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AutoscaleSettings {
    pub max_throughput: Option<i64>,
}

/// Explicit offer returned by the provider for one resource.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ThroughputOffer {
    pub throughput: Option<i64>,
    pub autoscale_settings: Option<AutoscaleSettings>,
}

/// Outcome of asking the provider for a resource's offer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThroughputLookup {
    Found(ThroughputOffer),
    /// No offer exists; the resource inherits throughput from its parent.
    InheritedAbsence,
    /// The account is serverless and has no offers at all.
    ServerlessAbsence,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ResourceLevel {
    Database,
    Container,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThroughputClassification {
    pub mode: ThroughputMode,
    pub throughput_type: Option<ThroughputType>,
    pub value: Option<i64>,
}

impl ThroughputClassification {
    /// A database without its own offer leaves each container to provision
    /// itself (Dedicated); a container without its own offer draws from the
    /// database pool (Shared). An offer found at either level flips that.
    pub fn classify(level: ResourceLevel, lookup: ThroughputLookup) -> Self {
        match lookup {
            ThroughputLookup::Found(offer) => {
                let mode = match level {
                    ResourceLevel::Database => ThroughputMode::Shared,
                    ResourceLevel::Container => ThroughputMode::Dedicated,
                };
                match offer.autoscale_settings {
                    Some(settings) => Self {
                        mode,
                        throughput_type: Some(ThroughputType::Autoscale),
                        value: settings.max_throughput,
                    },
                    None => Self {
                        mode,
                        throughput_type: Some(ThroughputType::Manual),
                        value: offer.throughput,
                    },
                }
            }
            ThroughputLookup::InheritedAbsence => Self {
                mode: match level {
                    ResourceLevel::Database => ThroughputMode::Dedicated,
                    ResourceLevel::Container => ThroughputMode::Shared,
                },
                throughput_type: None,
                value: None,
            },
            ThroughputLookup::ServerlessAbsence => Self {
                mode: ThroughputMode::Serverless,
                throughput_type: Some(ThroughputType::Serverless),
                value: None,
            },
        }
    }

    pub fn is_shared(&self) -> bool {
        self.mode == ThroughputMode::Shared
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AutoscaleSettings, ResourceLevel, ThroughputClassification, ThroughputLookup,
        ThroughputMode, ThroughputOffer, ThroughputType,
    };

    #[test]
    fn absence_inverts_between_levels() {
        let database = ThroughputClassification::classify(
            ResourceLevel::Database,
            ThroughputLookup::InheritedAbsence,
        );
        let container = ThroughputClassification::classify(
            ResourceLevel::Container,
            ThroughputLookup::InheritedAbsence,
        );

        assert_eq!(database.mode, ThroughputMode::Dedicated);
        assert_eq!(container.mode, ThroughputMode::Shared);
        assert_eq!(database.throughput_type, None);
        assert_eq!(container.value, None);
    }

    #[test]
    fn found_offer_inverts_between_levels() {
        let offer = ThroughputLookup::Found(ThroughputOffer {
            throughput: Some(400),
            autoscale_settings: None,
        });

        let database = ThroughputClassification::classify(ResourceLevel::Database, offer);
        let container = ThroughputClassification::classify(ResourceLevel::Container, offer);

        assert_eq!(database.mode, ThroughputMode::Shared);
        assert_eq!(container.mode, ThroughputMode::Dedicated);
        assert_eq!(container.throughput_type, Some(ThroughputType::Manual));
        assert_eq!(container.value, Some(400));
    }

    #[test]
    fn autoscale_settings_win_over_provisioned_value() {
        let offer = ThroughputLookup::Found(ThroughputOffer {
            throughput: Some(400),
            autoscale_settings: Some(AutoscaleSettings {
                max_throughput: Some(4000),
            }),
        });

        let classification = ThroughputClassification::classify(ResourceLevel::Container, offer);
        assert_eq!(classification.throughput_type, Some(ThroughputType::Autoscale));
        assert_eq!(classification.value, Some(4000));
    }

    #[test]
    fn serverless_is_level_independent() {
        for level in [ResourceLevel::Database, ResourceLevel::Container] {
            let classification =
                ThroughputClassification::classify(level, ThroughputLookup::ServerlessAbsence);
            assert_eq!(classification.mode, ThroughputMode::Serverless);
            assert_eq!(classification.throughput_type, Some(ThroughputType::Serverless));
            assert_eq!(classification.value, None);
            assert!(!classification.is_shared());
        }
    }
}
