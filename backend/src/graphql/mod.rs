//! Metrics backend wire contract.
//!
//! ```text
//! QueryRequest ──build_query──► query string ──MetricsClient──► MetricsQueryResponse
//! ```

pub mod client;
pub mod fingerprint;
pub mod query_builder;
pub mod request;
pub mod response;

pub use client::MetricsClient;
#[cfg(feature = "http-client")]
pub use client::HttpProxyClient;
pub use fingerprint::{query_digest, query_fingerprint};
pub use query_builder::build_query;
pub use request::{
    BackendFilter, DataOrigin, DistributionOptions, LogicalOperator, MetricOptions, MetricRequest,
    QueryRequest, TimePeriod, METRIC_ALIAS_PREFIX,
};
pub use response::{
    BackendError, Distribution, GeneralStatistics, GeneralStatsField, GetMetrics, GroupedBy, Kpi,
    KpiGroupEntry, MetricResult, MetricsQueryResponse,
};
