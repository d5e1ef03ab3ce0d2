//! Plan domain model.
//!
//! Everything here is plain data produced by an external planner and consumed
//! read-only by the engine.

pub mod macros;

pub mod enums;
pub mod filter;
pub mod group_by;
pub mod plan;

pub use enums::{DateProperty, NumericProperty, Operator, ProviderGroupId, SexType, StrokeType, TimeGrain};
pub use filter::FilterNode;
pub use group_by::{Bucket, GroupBySpec, GroupKind, TimeWindowSpec, MAX_WINDOW_MONTHS};
pub use plan::{AnalysisPlan, ChartSpec, DistributionSpec, MetricSpec, StatisticalTestSpec};
