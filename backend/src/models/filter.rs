//! Recursive filter expressions attached to charts and combinations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{DateProperty, NumericProperty, Operator, SexType, StrokeType};

fn default_true() -> bool {
    true
}

/// A plan-level filter tree.
///
/// Logical nodes nest arbitrarily; leaves compare a single case property.
/// Unknown enum codes fail at deserialization, so a constructed tree is always
/// well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterNode {
    And {
        children: Vec<FilterNode>,
    },
    Or {
        children: Vec<FilterNode>,
    },
    Not {
        child: Box<FilterNode>,
    },
    IntegerRange {
        property: NumericProperty,
        operator: Operator,
        value: i64,
    },
    /// Equality on a boolean case flag (e.g. `"THROMBOLYSIS"`).
    Boolean {
        property: String,
        value: bool,
    },
    Sex {
        value: SexType,
        #[serde(default = "default_true")]
        include: bool,
    },
    Stroke {
        value: StrokeType,
        #[serde(default = "default_true")]
        include: bool,
    },
    Date {
        property: DateProperty,
        operator: Operator,
        value: NaiveDate,
    },
}

impl FilterNode {
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::And { children }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Or { children }
    }

    pub fn not(child: FilterNode) -> Self {
        FilterNode::Not {
            child: Box::new(child),
        }
    }

    pub fn integer(property: NumericProperty, operator: Operator, value: i64) -> Self {
        FilterNode::IntegerRange {
            property,
            operator,
            value,
        }
    }

    pub fn sex(value: SexType) -> Self {
        FilterNode::Sex {
            value,
            include: true,
        }
    }

    pub fn stroke(value: StrokeType) -> Self {
        FilterNode::Stroke {
            value,
            include: true,
        }
    }

    pub fn date(property: DateProperty, operator: Operator, value: NaiveDate) -> Self {
        FilterNode::Date {
            property,
            operator,
            value,
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            FilterNode::And { .. } | FilterNode::Or { .. } | FilterNode::Not { .. }
        )
    }

    /// Maximum nesting depth, counting leaves as depth 1.
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::And { children } | FilterNode::Or { children } => {
                1 + children.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
            FilterNode::Not { child } => 1 + child.depth(),
            _ => 1,
        }
    }
}
