//! Series-based charts: every payload is a list of named `(x, y)` series.

use serde::{Deserialize, Serialize};

use super::types::{ChartMetadata, ChartSeries};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub metadata: ChartMetadata,
    pub series: Vec<ChartSeries>,
    #[serde(default)]
    pub smooth: bool,
    #[serde(default = "default_true")]
    pub show_points: bool,
    #[serde(default)]
    pub fill_area: bool,
}

impl LineChart {
    pub fn new(metadata: ChartMetadata, series: Vec<ChartSeries>) -> Self {
        Self {
            metadata,
            series,
            smooth: false,
            show_points: true,
            fill_area: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub metadata: ChartMetadata,
    pub series: Vec<ChartSeries>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub stacked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_width: Option<f64>,
}

impl BarChart {
    pub fn new(metadata: ChartMetadata, series: Vec<ChartSeries>) -> Self {
        Self {
            metadata,
            series,
            orientation: Orientation::Vertical,
            stacked: false,
            bar_width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaChart {
    pub metadata: ChartMetadata,
    pub series: Vec<ChartSeries>,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub normalize: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
}

impl AreaChart {
    pub fn new(metadata: ChartMetadata, series: Vec<ChartSeries>) -> Self {
        Self {
            metadata,
            series,
            stacked: false,
            normalize: false,
            transparency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPlot {
    pub metadata: ChartMetadata,
    pub series: Vec<ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_size: Option<f64>,
    #[serde(default)]
    pub show_trend_line: bool,
    /// Field driving bubble size, for bubble charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bubble_size_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarChart {
    pub metadata: ChartMetadata,
    pub series: Vec<ChartSeries>,
    /// Axis names, one per spoke.
    pub axes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_max: Option<f64>,
    #[serde(default)]
    pub filled: bool,
}
