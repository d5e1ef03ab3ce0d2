//! Metric and label metadata.
//!
//! The engine only reads metadata; a provider is built once at startup and
//! shared behind an `Arc` by every concurrent task.

pub mod catalog;
pub mod defaults;

use crate::models::{SexType, StrokeType};

pub use catalog::{CatalogEntry, EnumOption, MetricCatalog, NumericBlock};
pub use defaults::{
    derive_distribution, DEFAULT_BUCKETS, DEFAULT_RANGE_MAX, DEFAULT_RANGE_MIN,
};

/// Numeric description of a metric; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericProfile {
    pub unit: Option<String>,
    pub range_min: Option<i64>,
    pub range_max: Option<i64>,
    pub default_buckets: Option<u32>,
}

pub trait MetadataProvider: Send + Sync {
    /// Preferred display name, falling back to the canonical code.
    fn metric_display_name(&self, metric_code: &str) -> String;

    fn numeric_profile(&self, metric_code: &str) -> Option<NumericProfile>;

    /// Display name for a grouping field (e.g. `"REGION"` -> `"Region"`).
    fn field_display_name(&self, field: &str) -> String;

    /// Label for one value of an enumerated field, if the catalog knows it.
    fn category_label(&self, field: &str, raw_value: &str) -> Option<String>;

    fn sex_label(&self, sex: SexType) -> String;

    fn stroke_label(&self, stroke: StrokeType) -> String;
}

/// Provider that knows nothing and echoes canonical codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataProvider for NoMetadata {
    fn metric_display_name(&self, metric_code: &str) -> String {
        metric_code.to_ascii_uppercase()
    }

    fn numeric_profile(&self, _metric_code: &str) -> Option<NumericProfile> {
        None
    }

    fn field_display_name(&self, field: &str) -> String {
        field.to_ascii_uppercase()
    }

    fn category_label(&self, _field: &str, _raw_value: &str) -> Option<String> {
        None
    }

    fn sex_label(&self, sex: SexType) -> String {
        sex.as_str().to_string()
    }

    fn stroke_label(&self, stroke: StrokeType) -> String {
        stroke.as_str().to_string()
    }
}
