use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::models::{CoreError, CoreErrorKind, CoreResult};
use crate::providers::{
    ClientFactory, MetricsProvider, ResourceProvider, SubscriptionDirectory, TelemetrySink,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CollaboratorKind {
    SubscriptionDirectory,
    /// Keyed by subscription id.
    ResourceProvider,
    MetricsProvider,
    TelemetrySink,
}

/// Collaborator handles created on first use and kept for the lifetime of the
/// owning context. Entries are never replaced; when two workers race on first
/// use, one handle is published and the other is dropped.
pub struct ClientCache {
    factory: Arc<dyn ClientFactory>,
    telemetry_endpoint: String,
    subscription_directory: OnceLock<Arc<dyn SubscriptionDirectory>>,
    metrics_provider: OnceLock<Arc<dyn MetricsProvider>>,
    telemetry_sink: OnceLock<Arc<dyn TelemetrySink>>,
    resource_providers: RwLock<HashMap<String, Arc<dyn ResourceProvider>>>,
}

impl ClientCache {
    pub fn new(factory: Arc<dyn ClientFactory>, telemetry_endpoint: impl Into<String>) -> Self {
        Self {
            factory,
            telemetry_endpoint: telemetry_endpoint.into(),
            subscription_directory: OnceLock::new(),
            metrics_provider: OnceLock::new(),
            telemetry_sink: OnceLock::new(),
            resource_providers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the handle for `kind` if it does not exist yet.
    pub fn ensure(&self, kind: CollaboratorKind, subscription_id: Option<&str>) -> CoreResult<()> {
        match kind {
            CollaboratorKind::SubscriptionDirectory => self.subscription_directory().map(drop),
            CollaboratorKind::MetricsProvider => self.metrics_provider().map(drop),
            CollaboratorKind::TelemetrySink => self.telemetry_sink().map(drop),
            CollaboratorKind::ResourceProvider => {
                let Some(subscription_id) = subscription_id else {
                    return Err(CoreError::new(
                        CoreErrorKind::InvalidInput,
                        "resource provider requires a subscription id",
                    ));
                };
                self.resource_provider(subscription_id).map(drop)
            }
        }
    }

    pub fn subscription_directory(&self) -> CoreResult<Arc<dyn SubscriptionDirectory>> {
        if let Some(existing) = self.subscription_directory.get() {
            return Ok(Arc::clone(existing));
        }
        let created = self.factory.subscription_directory()?;
        Ok(Arc::clone(self.subscription_directory.get_or_init(|| created)))
    }

    pub fn metrics_provider(&self) -> CoreResult<Arc<dyn MetricsProvider>> {
        if let Some(existing) = self.metrics_provider.get() {
            return Ok(Arc::clone(existing));
        }
        let created = self.factory.metrics_provider()?;
        Ok(Arc::clone(self.metrics_provider.get_or_init(|| created)))
    }

    pub fn telemetry_sink(&self) -> CoreResult<Arc<dyn TelemetrySink>> {
        if let Some(existing) = self.telemetry_sink.get() {
            return Ok(Arc::clone(existing));
        }
        let created = self.factory.telemetry_sink(&self.telemetry_endpoint)?;
        Ok(Arc::clone(self.telemetry_sink.get_or_init(|| created)))
    }

    pub fn resource_provider(&self, subscription_id: &str) -> CoreResult<Arc<dyn ResourceProvider>> {
        {
            let providers = self.resource_providers.read().map_err(|_| poisoned())?;
            if let Some(existing) = providers.get(subscription_id) {
                return Ok(Arc::clone(existing));
            }
        }

        // Built outside the lock; a concurrent first use may build a spare.
        let created = self.factory.resource_provider(subscription_id)?;
        let mut providers = self.resource_providers.write().map_err(|_| poisoned())?;
        let published = providers
            .entry(subscription_id.to_string())
            .or_insert(created);
        Ok(Arc::clone(published))
    }

    pub fn cached_subscriptions(&self) -> CoreResult<Vec<String>> {
        let providers = self.resource_providers.read().map_err(|_| poisoned())?;
        let mut subscriptions: Vec<String> = providers.keys().cloned().collect();
        subscriptions.sort();
        Ok(subscriptions)
    }
}

fn poisoned() -> CoreError {
    CoreError::new(CoreErrorKind::Internal, "client cache lock poisoned")
}
