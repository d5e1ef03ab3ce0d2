//! Response models for the metrics backend.
//!
//! Metric results arrive under dynamic `metric_<CODE>` keys next to the fixed
//! `generalStatsGroup` key; [`GetMetrics`] collects them into a map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::request::METRIC_ALIAS_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStatistics {
    pub cases_in_period: i64,
    pub filtered_cases_in_period: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStatsGroup {
    pub general_statistics: GeneralStatistics,
}

/// The backend documents a single object but has been seen returning a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneralStatsField {
    One(GeneralStatsGroup),
    Many(Vec<GeneralStatsGroup>),
}

impl GeneralStatsField {
    pub fn first(&self) -> Option<&GeneralStatistics> {
        match self {
            GeneralStatsField::One(group) => Some(&group.general_statistics),
            GeneralStatsField::Many(groups) => groups.first().map(|g| &g.general_statistics),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedBy {
    pub group_item_name: String,
}

/// Histogram as parallel arrays; `edges[i]` pairs with `case_count[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub edges: Vec<f64>,
    pub case_count: Vec<i64>,
    #[serde(default)]
    pub percents: Vec<Option<f64>>,
    #[serde(default)]
    pub normalized_percents: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    #[serde(default)]
    pub case_count: Vec<i64>,
    pub percents: Option<Vec<f64>>,
    pub normalized_percents: Option<Vec<f64>>,
    pub cohort_size: Option<i64>,
    pub normalized_cohort_size: Option<Vec<i64>>,
    pub median: Option<f64>,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub confidence_interval_mean: Option<Vec<Option<f64>>>,
    pub confidence_interval_median: Option<Vec<Option<f64>>>,
    pub interquartile_range: Option<f64>,
    pub quartiles: Option<Vec<f64>>,
    pub d1: Option<Distribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiGroupEntry {
    pub kpi1: Kpi,
    pub grouped_by: Option<GroupedBy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub kpi_group: Vec<KpiGroupEntry>,
}

#[derive(Debug, Deserialize)]
struct RawGetMetrics {
    #[serde(rename = "generalStatsGroup", default)]
    general_stats_group: Option<GeneralStatsField>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGetMetrics")]
pub struct GetMetrics {
    pub general_stats_group: Option<GeneralStatsField>,
    /// Keyed by response alias (`metric_<CODE>`). Null metric entries are dropped.
    pub metrics: BTreeMap<String, MetricResult>,
}

impl TryFrom<RawGetMetrics> for GetMetrics {
    type Error = serde_json::Error;

    fn try_from(raw: RawGetMetrics) -> Result<Self, Self::Error> {
        let mut metrics = BTreeMap::new();
        for (key, value) in raw.rest {
            if !key.starts_with(METRIC_ALIAS_PREFIX) || value.is_null() {
                continue;
            }
            metrics.insert(key, serde_json::from_value(value)?);
        }
        Ok(GetMetrics {
            general_stats_group: raw.general_stats_group,
            metrics,
        })
    }
}

impl GetMetrics {
    pub fn metric(&self, alias: &str) -> Option<&MetricResult> {
        self.metrics.get(alias)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryData {
    pub get_metrics: Option<GetMetrics>,
}

/// One structured backend error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendError {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsQueryResponse {
    pub data: Option<QueryData>,
    pub errors: Option<Vec<BackendError>>,
}

impl MetricsQueryResponse {
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flatten()
            .map(|e| e.message.as_str())
            .collect()
    }

    /// `None` when the payload carries no results (null data is not a fault).
    pub fn get_metrics(&self) -> Option<&GetMetrics> {
        self.data.as_ref().and_then(|d| d.get_metrics.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": {
            "getMetrics": {
                "metric_DTN": {
                    "kpiGroup": [
                        {
                            "kpi1": {
                                "caseCount": [12],
                                "d1": {
                                    "edges": [0, 10, 20],
                                    "caseCount": [3, 5, 4],
                                    "percents": [0.25, null, 0.33],
                                    "normalizedPercents": [0.2, 0.4, 0.4]
                                }
                            },
                            "groupedBy": {"groupItemName": "NORTH"}
                        }
                    ]
                },
                "metric_AGE": null,
                "generalStatsGroup": {
                    "generalStatistics": {"casesInPeriod": 100, "filteredCasesInPeriod": 12}
                }
            }
        }
    }"#;

    #[test]
    fn test_collects_metric_aliases() {
        let resp: MetricsQueryResponse = serde_json::from_str(SAMPLE).unwrap();
        assert!(!resp.has_errors());
        let metrics = resp.get_metrics().unwrap();
        assert_eq!(metrics.metrics.len(), 1);
        let dtn = metrics.metric("metric_DTN").unwrap();
        let entry = &dtn.kpi_group[0];
        assert_eq!(entry.grouped_by.as_ref().unwrap().group_item_name, "NORTH");
        let d1 = entry.kpi1.d1.as_ref().unwrap();
        assert_eq!(d1.edges, vec![0.0, 10.0, 20.0]);
        assert_eq!(d1.percents[1], None);
        assert_eq!(
            metrics
                .general_stats_group
                .as_ref()
                .and_then(|g| g.first())
                .map(|s| s.filtered_cases_in_period),
            Some(12)
        );
    }

    #[test]
    fn test_general_stats_as_list() {
        let json = r#"{"data": {"getMetrics": {"generalStatsGroup": [
            {"generalStatistics": {"casesInPeriod": 5, "filteredCasesInPeriod": 2}}
        ]}}}"#;
        let resp: MetricsQueryResponse = serde_json::from_str(json).unwrap();
        let stats = resp.get_metrics().unwrap().general_stats_group.as_ref().unwrap();
        assert_eq!(stats.first().unwrap().cases_in_period, 5);
    }

    #[test]
    fn test_null_data_with_errors() {
        let json = r#"{"data": null, "errors": [{"message": "bad metric", "path": ["getMetrics"]}]}"#;
        let resp: MetricsQueryResponse = serde_json::from_str(json).unwrap();
        assert!(resp.has_errors());
        assert_eq!(resp.error_messages(), vec!["bad metric"]);
        assert!(resp.get_metrics().is_none());
        assert!(resp.errors.unwrap()[0].extra.contains_key("path"));
    }

    #[test]
    fn test_malformed_metric_is_an_error() {
        let json = r#"{"data": {"getMetrics": {"metric_DTN": {"kpiGroup": "oops"}}}}"#;
        assert!(serde_json::from_str::<MetricsQueryResponse>(json).is_err());
    }
}
