//! Translation of plan filter trees into backend filters.

use chrono::NaiveDate;

use crate::graphql::{BackendFilter, LogicalOperator};
use crate::models::{DateProperty, FilterNode};

/// Translate a plan filter tree.
///
/// AND/OR always yield a logical node, keeping only children that translate
/// to something (so an AND of untranslatable leaves becomes an empty AND).
/// NOT yields `None` exactly when its child does. Boolean leaves have no
/// backend translation yet and yield `None`.
pub fn translate(node: &FilterNode) -> Option<BackendFilter> {
    match node {
        FilterNode::And { children } => Some(logical(LogicalOperator::And, children)),
        FilterNode::Or { children } => Some(logical(LogicalOperator::Or, children)),
        FilterNode::Not { child } => translate(child).map(BackendFilter::not),
        FilterNode::IntegerRange {
            property,
            operator,
            value,
        } => Some(BackendFilter::Integer {
            property: *property,
            operator: *operator,
            value: *value,
        }),
        FilterNode::Boolean { .. } => None,
        FilterNode::Sex { value, include } => Some(BackendFilter::Sex {
            value: *value,
            contains: *include,
        }),
        FilterNode::Stroke { value, include } => Some(BackendFilter::Stroke {
            value: *value,
            contains: *include,
        }),
        FilterNode::Date {
            property,
            operator,
            value,
        } => Some(BackendFilter::Date {
            property: *property,
            operator: *operator,
            value: *value,
        }),
    }
}

fn logical(operator: LogicalOperator, children: &[FilterNode]) -> BackendFilter {
    BackendFilter::Logical {
        operator,
        children: children.iter().filter_map(translate).collect(),
    }
}

pub fn translate_opt(node: Option<&FilterNode>) -> Option<BackendFilter> {
    node.and_then(translate)
}

/// Query window implied by `DISCHARGE_DATE` leaves.
///
/// Returns the earliest lower bound (`GE`/`GT`) and the latest upper bound
/// (`LE`/`LT`) found outside any NOT subtree: the smallest window covering
/// every bound the filter mentions. Either side is `None` when no leaf
/// constrains it.
pub fn collect_date_bounds(filter: Option<&BackendFilter>) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let mut start: Option<NaiveDate> = None;
    let mut end: Option<NaiveDate> = None;
    if let Some(filter) = filter {
        visit_dates(filter, &mut start, &mut end);
    }
    (start, end)
}

fn visit_dates(node: &BackendFilter, start: &mut Option<NaiveDate>, end: &mut Option<NaiveDate>) {
    match node {
        BackendFilter::Logical {
            operator: LogicalOperator::Not,
            ..
        } => {}
        BackendFilter::Logical { children, .. } => {
            for child in children {
                visit_dates(child, start, end);
            }
        }
        BackendFilter::Date {
            property: DateProperty::DischargeDate,
            operator,
            value,
        } => {
            if operator.is_lower_bound() && start.map_or(true, |s| *value < s) {
                *start = Some(*value);
            }
            if operator.is_upper_bound() && end.map_or(true, |e| *value > e) {
                *end = Some(*value);
            }
        }
        _ => {}
    }
}
