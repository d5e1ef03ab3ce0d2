//! Public API surface of the plan engine.
//!
//! This file consolidates the types a caller needs to build a plan, run it and
//! consume the result. All DTOs derive Serialize/Deserialize.

// Plan
pub use crate::models::AnalysisPlan;
pub use crate::models::Bucket;
pub use crate::models::ChartSpec;
pub use crate::models::DateProperty;
pub use crate::models::DistributionSpec;
pub use crate::models::FilterNode;
pub use crate::models::GroupBySpec;
pub use crate::models::MetricSpec;
pub use crate::models::NumericProperty;
pub use crate::models::Operator;
pub use crate::models::ProviderGroupId;
pub use crate::models::SexType;
pub use crate::models::StatisticalTestSpec;
pub use crate::models::StrokeType;
pub use crate::models::TimeGrain;
pub use crate::models::TimeWindowSpec;

// Output
pub use crate::charts::ChartAxis;
pub use crate::charts::ChartDto;
pub use crate::charts::ChartMetadata;
pub use crate::charts::ChartPoint;
pub use crate::charts::ChartSeries;
pub use crate::charts::ChartType;
pub use crate::charts::StatisticalTestResult;
pub use crate::charts::VisualizationResponse;

// Engine
pub use crate::config::EngineConfig;
pub use crate::error::{EngineError, EngineResult, ErrorContext};
pub use crate::graphql::MetricsClient;
pub use crate::graphql::MetricsQueryResponse;
pub use crate::metadata::MetadataProvider;
pub use crate::metadata::MetricCatalog;
pub use crate::services::ExecutionOptions;
pub use crate::services::FaultPolicy;
pub use crate::services::PlanExecutor;
pub use crate::services::ProgressFn;

#[cfg(feature = "http-client")]
pub use crate::graphql::HttpProxyClient;
