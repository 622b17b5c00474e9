pub mod payload;

use std::sync::Arc;

use serde_json::Value;

use crate::config::StreamTarget;
use crate::models::{
    CoreError, CoreErrorKind, CoreResult, MetricsQuery, MetricsResponse, ResourceAddress,
};
use crate::task_context::current_task_kind;

pub use payload::{
    ArmResource, VisibleSubscription, parse_accounts, parse_first_service, parse_resource_list,
    parse_subscriptions, parse_throughput_settings,
};

/// Message the provider attaches to a 400 when an account has no offers.
pub const SERVERLESS_OFFER_MESSAGE: &str =
    "Reading or replacing offers is not supported for serverless accounts.";

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("resource not found: {message}")]
    NotFound { message: String },
    #[error("request rejected with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("request throttled: {message}")]
    Throttled { message: String },
    #[error("transport failure: {message}")]
    Transport { message: String },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Http { status: 404, .. }
        )
    }

    pub fn is_serverless_signal(&self) -> bool {
        matches!(
            self,
            Self::Http { status: 400, message } if message.contains(SERVERLESS_OFFER_MESSAGE)
        )
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Throttled { .. } | Self::Transport { .. } => true,
            Self::Http { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::NotFound { .. } => false,
        }
    }
}

impl From<ProviderError> for CoreError {
    fn from(error: ProviderError) -> Self {
        // Client rejections other than the serverless signal stay fatal
        // until there is a reason to treat them as retryable.
        let kind = if error.is_transient() {
            CoreErrorKind::Transient
        } else {
            CoreErrorKind::ProviderFailure
        };
        CoreError {
            task: current_task_kind(),
            api_kind: None,
            kind,
            message: error.to_string(),
        }
    }
}

/// Lists subscriptions visible to the worker identity. Not bound to one
/// subscription.
pub trait SubscriptionDirectory: Send + Sync {
    fn list_subscriptions(&self) -> ProviderResult<String>;
}

/// Resource-provider client bound to one subscription. Every call returns the
/// provider's JSON body.
pub trait ResourceProvider: Send + Sync {
    fn list_database_accounts(&self) -> ProviderResult<String>;

    fn list_account_services(&self, account: &ResourceAddress) -> ProviderResult<String>;

    /// Lists children of `parent` of one resource type, e.g. `sqlDatabases`.
    fn list_children(&self, parent: &ResourceAddress, child_kind: &str)
    -> ProviderResult<String>;

    /// Reads `{resource}/throughputSettings/default`.
    fn get_throughput_settings(&self, resource: &ResourceAddress) -> ProviderResult<String>;
}

pub trait MetricsProvider: Send + Sync {
    fn query_resource(&self, query: &MetricsQuery) -> ProviderResult<MetricsResponse>;
}

pub trait TelemetrySink: Send + Sync {
    fn upload(&self, target: &StreamTarget, rows: &[Value]) -> ProviderResult<()>;
}

/// Builds collaborator handles. Credential acquisition and transport live
/// behind this trait.
pub trait ClientFactory: Send + Sync {
    fn subscription_directory(&self) -> CoreResult<Arc<dyn SubscriptionDirectory>>;

    fn resource_provider(&self, subscription_id: &str) -> CoreResult<Arc<dyn ResourceProvider>>;

    fn metrics_provider(&self) -> CoreResult<Arc<dyn MetricsProvider>>;

    fn telemetry_sink(&self, endpoint: &str) -> CoreResult<Arc<dyn TelemetrySink>>;
}

#[cfg(test)]
mod tests {
    use super::{ProviderError, SERVERLESS_OFFER_MESSAGE};
    use crate::models::{CoreError, CoreErrorKind, TaskKind};
    use crate::task_context::with_task_kind;

    #[test]
    fn serverless_signal_requires_status_and_message() {
        let signal = ProviderError::Http {
            status: 400,
            message: format!("Request is invalid. {SERVERLESS_OFFER_MESSAGE} ActivityId: 1"),
        };
        let other_400 = ProviderError::Http {
            status: 400,
            message: "Bad request".to_string(),
        };
        let wrong_status = ProviderError::Http {
            status: 403,
            message: SERVERLESS_OFFER_MESSAGE.to_string(),
        };

        assert!(signal.is_serverless_signal());
        assert!(!other_400.is_serverless_signal());
        assert!(!wrong_status.is_serverless_signal());
    }

    #[test]
    fn conversion_separates_transient_from_fatal() {
        let throttled: CoreError = ProviderError::Http {
            status: 429,
            message: "slow down".to_string(),
        }
        .into();
        let rejected: CoreError = ProviderError::Http {
            status: 403,
            message: "forbidden".to_string(),
        }
        .into();

        assert_eq!(throttled.kind, CoreErrorKind::Transient);
        assert_eq!(rejected.kind, CoreErrorKind::ProviderFailure);
        assert!(throttled.is_retryable());
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn conversion_attributes_current_task() {
        let error = with_task_kind(TaskKind::ListContainers, || {
            CoreError::from(ProviderError::Transport {
                message: "connection reset".to_string(),
            })
        });
        assert_eq!(error.task, Some(TaskKind::ListContainers));
    }
}
