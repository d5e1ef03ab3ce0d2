//! Grouping specifications.
//!
//! Each variant is one grouping strategy. Equality and hashing are structural,
//! which is what plan validation relies on to reject duplicate groupings.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::enums::{SexType, StrokeType, TimeGrain};
use super::filter::FilterNode;

/// Half-open integer range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bucket {
    pub min: i64,
    pub max: i64,
}

impl Bucket {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Longest time window, in calendar months, a plan may group over.
pub const MAX_WINDOW_MONTHS: u32 = 1200;

/// Window restricting a time grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeWindowSpec {
    /// The last `last_n` units, ending with the current one.
    Relative { last_n: u32, unit: TimeGrain },
    /// Inclusive calendar range.
    Absolute {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl TimeWindowSpec {
    /// Number of calendar months the window touches.
    ///
    /// `None` for relative windows in sub-month units.
    pub fn month_span(&self) -> Option<u64> {
        match self {
            TimeWindowSpec::Relative { last_n, unit } => {
                let per_unit = match unit {
                    TimeGrain::Month => 1,
                    TimeGrain::Quarter => 3,
                    TimeGrain::Year => 12,
                    TimeGrain::Day | TimeGrain::Week | TimeGrain::Biweek => return None,
                };
                Some(u64::from(*last_n) * per_unit)
            }
            TimeWindowSpec::Absolute {
                start_date,
                end_date,
            } => {
                let months = |d: &NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                Some((months(end_date) - months(start_date) + 1).max(0) as u64)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupBySpec {
    Sex {
        #[serde(default)]
        categories: Option<Vec<SexType>>,
    },
    StrokeType {
        #[serde(default)]
        categories: Option<Vec<StrokeType>>,
    },
    Age {
        buckets: Vec<Bucket>,
    },
    Nihss {
        buckets: Vec<Bucket>,
    },
    Time {
        grain: TimeGrain,
        #[serde(default)]
        window: Option<TimeWindowSpec>,
        #[serde(default)]
        include_partial: Option<bool>,
    },
    /// Grouping on a backend-native field; the only pushdown-eligible case.
    CanonicalField {
        field: String,
        #[serde(default)]
        values: Option<Vec<String>>,
    },
    Boolean {
        property: String,
        #[serde(default)]
        values: Option<Vec<bool>>,
    },
    Custom {
        label: String,
        filters: Vec<FilterNode>,
    },
}

/// Discriminant of [`GroupBySpec`], used for per-kind validation and naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Sex,
    StrokeType,
    Age,
    Nihss,
    Time,
    CanonicalField,
    Boolean,
    Custom,
}

impl GroupKind {
    /// Kinds limited to one instance per chart.
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            GroupKind::Sex
                | GroupKind::StrokeType
                | GroupKind::Age
                | GroupKind::Nihss
                | GroupKind::Time
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            GroupKind::Sex => "GroupBySex",
            GroupKind::StrokeType => "GroupByStrokeType",
            GroupKind::Age => "GroupByAge",
            GroupKind::Nihss => "GroupByNIHSS",
            GroupKind::Time => "GroupByTime",
            GroupKind::CanonicalField => "GroupByCanonicalField",
            GroupKind::Boolean => "GroupByBoolean",
            GroupKind::Custom => "CustomGroup",
        }
    }
}

impl GroupBySpec {
    pub fn sex() -> Self {
        GroupBySpec::Sex { categories: None }
    }

    pub fn stroke_type() -> Self {
        GroupBySpec::StrokeType { categories: None }
    }

    pub fn canonical(field: impl Into<String>) -> Self {
        GroupBySpec::CanonicalField {
            field: field.into(),
            values: None,
        }
    }

    pub fn kind(&self) -> GroupKind {
        match self {
            GroupBySpec::Sex { .. } => GroupKind::Sex,
            GroupBySpec::StrokeType { .. } => GroupKind::StrokeType,
            GroupBySpec::Age { .. } => GroupKind::Age,
            GroupBySpec::Nihss { .. } => GroupKind::Nihss,
            GroupBySpec::Time { .. } => GroupKind::Time,
            GroupBySpec::CanonicalField { .. } => GroupKind::CanonicalField,
            GroupBySpec::Boolean { .. } => GroupKind::Boolean,
            GroupBySpec::Custom { .. } => GroupKind::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality_and_hash() {
        let a = GroupBySpec::Age {
            buckets: vec![Bucket::new(0, 50), Bucket::new(50, 120)],
        };
        let b = GroupBySpec::Age {
            buckets: vec![Bucket::new(0, 50), Bucket::new(50, 120)],
        };
        let c = GroupBySpec::Age {
            buckets: vec![Bucket::new(0, 60)],
        };
        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_deserialize_time_window() {
        let json = r#"{"kind": "time", "grain": "month", "window": {"type": "relative", "last_n": 6, "unit": "MONTH"}}"#;
        let spec: GroupBySpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec,
            GroupBySpec::Time {
                grain: TimeGrain::Month,
                window: Some(TimeWindowSpec::Relative {
                    last_n: 6,
                    unit: TimeGrain::Month
                }),
                include_partial: None,
            }
        );
        assert!(spec.kind().is_singleton());
    }

    #[test]
    fn test_canonical_is_not_singleton() {
        assert!(!GroupBySpec::canonical("REGION").kind().is_singleton());
    }
}
