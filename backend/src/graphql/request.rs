//! Typed query request mirroring the metrics backend's input shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DateProperty, NumericProperty, Operator, ProviderGroupId, SexType, StrokeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        }
    }
}

/// Filter tree in the backend's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendFilter {
    Logical {
        operator: LogicalOperator,
        children: Vec<BackendFilter>,
    },
    Integer {
        property: NumericProperty,
        operator: Operator,
        value: i64,
    },
    Boolean {
        property: String,
        value: bool,
    },
    Sex {
        value: SexType,
        contains: bool,
    },
    Stroke {
        value: StrokeType,
        contains: bool,
    },
    Date {
        property: DateProperty,
        operator: Operator,
        value: NaiveDate,
    },
}

impl BackendFilter {
    pub fn and(children: Vec<BackendFilter>) -> Self {
        BackendFilter::Logical {
            operator: LogicalOperator::And,
            children,
        }
    }

    pub fn or(children: Vec<BackendFilter>) -> Self {
        BackendFilter::Logical {
            operator: LogicalOperator::Or,
            children,
        }
    }

    pub fn not(child: BackendFilter) -> Self {
        BackendFilter::Logical {
            operator: LogicalOperator::Not,
            children: vec![child],
        }
    }
}

/// Bounds passed to the metric's `kpiOptions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOptions {
    pub lower_boundary: Option<i64>,
    pub upper_boundary: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOptions {
    pub bin_count: u32,
    pub lower_bound: i64,
    pub upper_bound: i64,
}

/// Request for one metric inside a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRequest {
    pub metric_code: String,
    pub alias: Option<String>,
    pub include_stats: bool,
    pub include_grouping: bool,
    pub options: Option<MetricOptions>,
    pub distribution: Option<DistributionOptions>,
}

impl MetricRequest {
    pub fn new(metric_code: impl Into<String>) -> Self {
        Self {
            metric_code: metric_code.into().to_ascii_uppercase(),
            alias: None,
            include_stats: false,
            include_grouping: false,
            options: None,
            distribution: None,
        }
    }

    pub fn with_stats(mut self) -> Self {
        self.include_stats = true;
        self
    }

    /// Request a distribution; also bounds the KPI to the same range.
    pub fn with_distribution(mut self, bin_count: u32, lower: i64, upper: i64) -> Self {
        self.distribution = Some(DistributionOptions {
            bin_count,
            lower_bound: lower,
            upper_bound: upper,
        });
        self.with_bounds(lower, upper)
    }

    pub fn with_bounds(mut self, lower: i64, upper: i64) -> Self {
        let options = self.options.get_or_insert_with(MetricOptions::default);
        options.lower_boundary = Some(lower);
        options.upper_boundary = Some(upper);
        self
    }

    /// Response key this metric is returned under.
    pub fn alias(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}{}", METRIC_ALIAS_PREFIX, self.metric_code))
    }
}

pub const METRIC_ALIAS_PREFIX: &str = "metric_";

/// Inclusive query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TimePeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Fill missing bounds from `defaults`.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, defaults: TimePeriod) -> Self {
        Self {
            start_date: start.unwrap_or(defaults.start_date),
            end_date: end.unwrap_or(defaults.end_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOrigin {
    pub provider_group_ids: Vec<ProviderGroupId>,
}

/// Complete input of one backend query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub metrics: Vec<MetricRequest>,
    pub time_period: TimePeriod,
    pub data_origin: DataOrigin,
    pub case_filter: Option<BackendFilter>,
    pub group_by: Option<String>,
    pub include_general_stats: bool,
}

impl QueryRequest {
    pub fn new(metrics: Vec<MetricRequest>, time_period: TimePeriod, data_origin: DataOrigin) -> Self {
        Self {
            metrics,
            time_period,
            data_origin,
            case_filter: None,
            group_by: None,
            include_general_stats: false,
        }
    }

    pub fn with_case_filter(mut self, filter: Option<BackendFilter>) -> Self {
        self.case_filter = filter;
        self
    }

    /// Push grouping to the backend; every metric then asks for its group label.
    pub fn with_group_by(mut self, field: Option<String>) -> Self {
        let grouped = field.is_some();
        self.group_by = field.map(|f| f.to_ascii_uppercase());
        for metric in &mut self.metrics {
            metric.include_grouping = grouped;
        }
        self
    }

    pub fn with_general_stats(mut self, include: bool) -> Self {
        self.include_general_stats = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> TimePeriod {
        TimePeriod::new(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_with_distribution_sets_bounds() {
        let metric = MetricRequest::new("dtn").with_distribution(10, 0, 120);
        assert_eq!(metric.metric_code, "DTN");
        assert_eq!(metric.alias(), "metric_DTN");
        assert_eq!(
            metric.options,
            Some(MetricOptions {
                lower_boundary: Some(0),
                upper_boundary: Some(120)
            })
        );
        assert_eq!(metric.distribution.map(|d| d.bin_count), Some(10));
    }

    #[test]
    fn test_group_by_flags_every_metric() {
        let request = QueryRequest::new(
            vec![MetricRequest::new("AGE"), MetricRequest::new("DTN")],
            period(),
            DataOrigin {
                provider_group_ids: vec![ProviderGroupId::new(1)],
            },
        )
        .with_group_by(Some("region".into()));
        assert_eq!(request.group_by.as_deref(), Some("REGION"));
        assert!(request.metrics.iter().all(|m| m.include_grouping));
    }

    #[test]
    fn test_resolve_fills_missing_bounds() {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let resolved = TimePeriod::resolve(Some(start), None, period());
        assert_eq!(resolved.start_date, start);
        assert_eq!(resolved.end_date, period().end_date);
    }
}
