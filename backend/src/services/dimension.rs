//! Grouping dimensions.
//!
//! A [`Dimension`] wraps one [`GroupBySpec`] and knows how to enumerate its
//! categories, label them, and restrict a query to one of them. Canonical-field
//! groupings are never enumerated; they are pushed to the backend instead.

use chrono::{Datelike, Months, NaiveDate};

use crate::metadata::MetadataProvider;
use crate::models::{
    Bucket, DateProperty, FilterNode, GroupBySpec, NumericProperty, Operator, SexType,
    StrokeType, TimeGrain, TimeWindowSpec, MAX_WINDOW_MONTHS,
};

/// One concrete value of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Sex(SexType),
    Stroke(StrokeType),
    Range(Bucket),
    /// Inclusive calendar period.
    Period { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Copy)]
pub struct Dimension<'a> {
    spec: &'a GroupBySpec,
    today: NaiveDate,
}

impl<'a> Dimension<'a> {
    /// `today` anchors relative time windows.
    pub fn new(spec: &'a GroupBySpec, today: NaiveDate) -> Self {
        Self { spec, today }
    }

    pub fn spec(&self) -> &'a GroupBySpec {
        self.spec
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self.spec, GroupBySpec::CanonicalField { .. })
    }

    /// Backend grouping field, for canonical dimensions.
    pub fn server_field(&self) -> Option<&'a str> {
        match self.spec {
            GroupBySpec::CanonicalField { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// Concrete categories in a deterministic order.
    ///
    /// Empty for dimensions that cannot be enumerated client-side: canonical
    /// fields, boolean flags, custom groups, and time groupings whose grain is
    /// not monthly or whose window is missing.
    pub fn categories(&self) -> Vec<Category> {
        match self.spec {
            GroupBySpec::Sex { categories } => categories
                .as_deref()
                .unwrap_or(SexType::ALL)
                .iter()
                .copied()
                .map(Category::Sex)
                .collect(),
            GroupBySpec::StrokeType { categories } => categories
                .as_deref()
                .unwrap_or(StrokeType::ALL)
                .iter()
                .copied()
                .map(Category::Stroke)
                .collect(),
            GroupBySpec::Age { buckets } | GroupBySpec::Nihss { buckets } => {
                buckets.iter().copied().map(Category::Range).collect()
            }
            GroupBySpec::Time {
                grain: TimeGrain::Month,
                window: Some(window),
                include_partial,
            } => month_periods(window, include_partial.unwrap_or(true), self.today)
                .into_iter()
                .map(|(start, end)| Category::Period { start, end })
                .collect(),
            GroupBySpec::Time { .. }
            | GroupBySpec::CanonicalField { .. }
            | GroupBySpec::Boolean { .. }
            | GroupBySpec::Custom { .. } => Vec::new(),
        }
    }

    pub fn label_for(&self, category: &Category, metadata: &dyn MetadataProvider) -> String {
        if let GroupBySpec::CanonicalField { field, .. } = self.spec {
            return field.clone();
        }
        match category {
            Category::Sex(sex) => metadata.sex_label(*sex),
            Category::Stroke(stroke) => metadata.stroke_label(*stroke),
            Category::Range(bucket) => format!("{}-{}", bucket.min, bucket.max),
            Category::Period { start, end } => format!("{} to {}", start, end),
        }
    }

    /// Filter fragment restricting a query to `category`.
    pub fn filter_for(&self, category: &Category) -> Option<FilterNode> {
        match (self.spec, category) {
            (GroupBySpec::Sex { .. }, Category::Sex(sex)) => Some(FilterNode::sex(*sex)),
            (GroupBySpec::StrokeType { .. }, Category::Stroke(stroke)) => {
                Some(FilterNode::stroke(*stroke))
            }
            (GroupBySpec::Age { .. }, Category::Range(bucket)) => {
                Some(range_filter(NumericProperty::Age, bucket))
            }
            (GroupBySpec::Nihss { .. }, Category::Range(bucket)) => {
                Some(range_filter(NumericProperty::AdmissionNihss, bucket))
            }
            (GroupBySpec::Time { .. }, Category::Period { start, end }) => Some(FilterNode::and(vec![
                FilterNode::date(DateProperty::DischargeDate, Operator::Ge, *start),
                FilterNode::date(DateProperty::DischargeDate, Operator::Le, *end),
            ])),
            _ => None,
        }
    }

    /// Name used in chart titles ("by Sex and Age").
    pub fn display_name(&self, metadata: &dyn MetadataProvider) -> String {
        match self.spec {
            GroupBySpec::Sex { .. } => "Sex".to_string(),
            GroupBySpec::StrokeType { .. } => "Stroke Type".to_string(),
            GroupBySpec::Age { .. } => metadata.field_display_name(NumericProperty::Age.as_str()),
            GroupBySpec::Nihss { .. } => {
                metadata.field_display_name(NumericProperty::AdmissionNihss.as_str())
            }
            GroupBySpec::Time { grain, .. } => match grain {
                TimeGrain::Month => "Month".to_string(),
                other => crate::metadata::catalog::humanize_key(other.as_str()),
            },
            GroupBySpec::CanonicalField { field, .. } => metadata.field_display_name(field),
            GroupBySpec::Boolean { property, .. } => metadata.field_display_name(property),
            GroupBySpec::Custom { label, .. } => label.clone(),
        }
    }
}

fn range_filter(property: NumericProperty, bucket: &Bucket) -> FilterNode {
    FilterNode::and(vec![
        FilterNode::integer(property, Operator::Ge, bucket.min),
        FilterNode::integer(property, Operator::Lt, bucket.max),
    ])
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

/// Calendar-month periods covered by a window, oldest first.
fn month_periods(
    window: &TimeWindowSpec,
    include_partial: bool,
    today: NaiveDate,
) -> Vec<(NaiveDate, NaiveDate)> {
    match window {
        TimeWindowSpec::Relative { .. } => {
            let months = match window.month_span() {
                Some(span) => span.min(u64::from(MAX_WINDOW_MONTHS)) as u32,
                None => return Vec::new(),
            };
            let mut anchor = month_start(today);
            if !include_partial {
                anchor = match anchor.checked_sub_months(Months::new(1)) {
                    Some(prev) => prev,
                    None => return Vec::new(),
                };
            }
            let mut periods: Vec<_> = (0..months)
                .filter_map(|i| anchor.checked_sub_months(Months::new(i)))
                .map(|first| (first, month_end(first)))
                .collect();
            periods.reverse();
            periods
        }
        TimeWindowSpec::Absolute {
            start_date,
            end_date,
        } => {
            let mut periods = Vec::new();
            let mut first = month_start(*start_date);
            while first <= *end_date && periods.len() < MAX_WINDOW_MONTHS as usize {
                let last = month_end(first);
                periods.push(((*start_date).max(first), (*end_date).min(last)));
                match first.checked_add_months(Months::new(1)) {
                    Some(next) => first = next,
                    None => break,
                }
            }
            periods
        }
    }
}
