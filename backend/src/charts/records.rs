//! Record-based charts carrying structured per-category entries instead of series.

use serde::{Deserialize, Serialize};

use super::types::ChartMetadata;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieChart {
    pub metadata: ChartMetadata,
    pub data: Vec<PieSlice>,
    #[serde(default = "default_true")]
    pub show_percentages: bool,
    #[serde(default)]
    pub donut: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
}

/// Five-number summary for one box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxEntry {
    pub name: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outliers: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlot {
    pub metadata: ChartMetadata,
    pub data: Vec<BoxEntry>,
    #[serde(default = "default_true")]
    pub show_outliers: bool,
    #[serde(default)]
    pub notched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub range_start: f64,
    pub range_end: f64,
    pub frequency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub metadata: ChartMetadata,
    pub data: Vec<HistogramBin>,
    pub bin_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_width: Option<f64>,
    #[serde(default)]
    pub cumulative: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_total: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_positive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallChart {
    pub metadata: ChartMetadata,
    pub data: Vec<WaterfallStep>,
    #[serde(default = "default_true")]
    pub show_connectors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_value: Option<f64>,
}
