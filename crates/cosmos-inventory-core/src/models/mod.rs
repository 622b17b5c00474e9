pub mod address;
pub mod api_kind;
pub mod error;
pub mod metrics;
pub mod snapshot;
pub mod task;
pub mod throughput;

pub use address::{AddressLevel, AddressSegment, ResourceAddress};
pub use api_kind::{ApiKind, CapacityMode};
pub use error::{CoreError, CoreErrorKind, CoreResult, attribute_error};
pub use metrics::{
    Aggregation, COSMOS_METRIC_NAMESPACE, Metric, MetricKind, MetricValue, MetricsQuery,
    MetricsResponse, TimeSeriesElement, TimeWindow,
};
pub use snapshot::{
    AccountSnapshot, ContainerSnapshot, DatabaseSnapshot, IndexingPolicy, MongoIndex, Snapshot,
    SnapshotKind,
};
pub use task::{
    GetAccountServicesRequest, GetContainerMetricsRequest, GetContainerThroughputRequest,
    GetDatabaseThroughputRequest, ListContainersRequest, ListDatabaseAccountsRequest,
    ListDatabasesRequest, TaskEnvelope, TaskKind, TaskRequest, seed_envelope,
};
pub use throughput::{
    AutoscaleSettings, ResourceLevel, ThroughputClassification, ThroughputLookup, ThroughputMode,
    ThroughputOffer, ThroughputType,
};
