//! Analysis plan: the declarative input of the engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::filter::FilterNode;
use super::group_by::{GroupBySpec, GroupKind, TimeWindowSpec, MAX_WINDOW_MONTHS};
use crate::error::{EngineError, EngineResult, ErrorContext};

/// Explicit distribution request for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub num_buckets: u32,
    pub min_value: i64,
    pub max_value: i64,
}

impl DistributionSpec {
    pub fn new(num_buckets: u32, min_value: i64, max_value: i64) -> Self {
        Self {
            num_buckets,
            min_value,
            max_value,
        }
    }

    /// Same spec with `min_value <= max_value`.
    pub fn normalized(self) -> Self {
        if self.min_value > self.max_value {
            Self {
                min_value: self.max_value,
                max_value: self.min_value,
                ..self
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Canonical metric code (e.g. `"DTN"`).
    pub metric: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub distribution: Option<DistributionSpec>,
}

impl MetricSpec {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into().to_ascii_uppercase(),
            title: None,
            description: None,
            distribution: None,
        }
    }

    pub fn with_distribution(mut self, distribution: DistributionSpec) -> Self {
        self.distribution = Some(distribution);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Requested chart type code; unknown codes render as a line chart.
    pub chart_type: String,
    #[serde(default)]
    pub filters: Option<FilterNode>,
    #[serde(default)]
    pub group_by: Option<Vec<GroupBySpec>>,
    pub metrics: Vec<MetricSpec>,
}

impl ChartSpec {
    pub fn new(chart_type: impl Into<String>, metrics: Vec<MetricSpec>) -> Self {
        Self {
            title: None,
            description: None,
            chart_type: chart_type.into(),
            filters: None,
            group_by: None,
            metrics,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_filters(mut self, filters: FilterNode) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<GroupBySpec>) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn groupings(&self) -> &[GroupBySpec] {
        self.group_by.as_deref().unwrap_or(&[])
    }

    /// Title used in log lines and error context.
    pub fn log_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Chart")
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.metrics.is_empty() {
            return Err(EngineError::invalid_plan("chart must request at least one metric")
                .with_chart(self.log_title()));
        }
        let mut codes: HashSet<String> = HashSet::new();
        for metric in &self.metrics {
            if !codes.insert(metric.metric.to_ascii_uppercase()) {
                return Err(EngineError::invalid_plan(format!(
                    "metric '{}' is requested more than once",
                    metric.metric
                ))
                .with_chart(self.log_title()));
            }
        }
        validate_groupings(self.groupings()).map_err(|e| e.with_chart(self.log_title()))
    }
}

/// A statistical test request. Accepted and validated but never executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTestSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub test_type: String,
    pub metrics: Vec<MetricSpec>,
    #[serde(default)]
    pub group_by: Option<Vec<GroupBySpec>>,
    #[serde(default)]
    pub filters: Option<FilterNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
    #[serde(default)]
    pub statistical_tests: Vec<StatisticalTestSpec>,
}

impl AnalysisPlan {
    pub fn new(charts: Vec<ChartSpec>) -> Self {
        Self {
            charts,
            statistical_tests: Vec::new(),
        }
    }

    /// Check every chart and test against the structural grouping rules.
    pub fn validate(&self) -> EngineResult<()> {
        for chart in &self.charts {
            chart.validate()?;
        }
        for test in &self.statistical_tests {
            validate_groupings(test.group_by.as_deref().unwrap_or(&[])).map_err(|e| {
                e.with_chart(test.title.as_deref().unwrap_or(test.test_type.as_str()))
            })?;
        }
        Ok(())
    }
}

fn invalid(message: String, spec: &GroupBySpec) -> EngineError {
    EngineError::invalid_plan(message).with_context(
        ErrorContext::new("validate_plan").with_details(format!("{:?}", spec)),
    )
}

fn validate_groupings(groups: &[GroupBySpec]) -> EngineResult<()> {
    let mut seen: HashSet<&GroupBySpec> = HashSet::new();
    let mut singleton_kinds: HashSet<GroupKind> = HashSet::new();
    let mut canonical_fields: HashSet<String> = HashSet::new();
    let mut boolean_properties: HashSet<String> = HashSet::new();

    for group in groups {
        if !seen.insert(group) {
            return Err(invalid("duplicate group_by spec".to_string(), group));
        }

        let kind = group.kind();
        if kind.is_singleton() && !singleton_kinds.insert(kind) {
            return Err(invalid(
                format!("only one {} is allowed per chart", kind.name()),
                group,
            ));
        }

        match group {
            GroupBySpec::CanonicalField { field, .. } => {
                if !canonical_fields.insert(field.to_ascii_uppercase()) {
                    return Err(invalid(
                        format!("duplicate GroupByCanonicalField for field '{}'", field),
                        group,
                    ));
                }
            }
            GroupBySpec::Boolean { property, .. } => {
                if !boolean_properties.insert(property.to_ascii_uppercase()) {
                    return Err(invalid(
                        format!("only one GroupByBoolean per property ('{}')", property),
                        group,
                    ));
                }
            }
            GroupBySpec::Age { buckets } | GroupBySpec::Nihss { buckets } => {
                if let Some(b) = buckets.iter().find(|b| b.min > b.max) {
                    return Err(invalid(
                        format!("bucket [{}, {}) has min greater than max", b.min, b.max),
                        group,
                    ));
                }
            }
            GroupBySpec::Time {
                window: Some(window),
                ..
            } => match window {
                TimeWindowSpec::Relative { last_n: 0, .. } => {
                    return Err(invalid("relative window must be positive".to_string(), group));
                }
                TimeWindowSpec::Absolute {
                    start_date,
                    end_date,
                } if start_date > end_date => {
                    return Err(invalid(
                        format!("window start {} is after end {}", start_date, end_date),
                        group,
                    ));
                }
                _ => {
                    if let Some(span) = window.month_span() {
                        if span > u64::from(MAX_WINDOW_MONTHS) {
                            return Err(invalid(
                                format!(
                                    "time window spans {} months, at most {} are allowed",
                                    span, MAX_WINDOW_MONTHS
                                ),
                                group,
                            ));
                        }
                    }
                }
            },
            _ => {}
        }
    }
    Ok(())
}
