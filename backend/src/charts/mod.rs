//! Visualization output model.
//!
//! [`VisualizationResponse`] is the terminal artifact of a plan execution. It is
//! built once and never mutated afterwards.

pub mod records;
pub mod types;
pub mod xy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use records::{
    BoxEntry, BoxPlot, Histogram, HistogramBin, PieChart, PieSlice, WaterfallChart, WaterfallStep,
};
pub use types::{AxisType, ChartAxis, ChartMetadata, ChartPoint, ChartSeries, ChartType};
pub use xy::{AreaChart, BarChart, LineChart, Orientation, RadarChart, ScatterPlot};

/// Concrete chart, tagged by its type code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartDto {
    Line(LineChart),
    Bar(BarChart),
    Box(BoxPlot),
    Histogram(Histogram),
    Scatter(ScatterPlot),
    Pie(PieChart),
    Radar(RadarChart),
    Waterfall(WaterfallChart),
    Area(AreaChart),
}

impl ChartDto {
    pub fn chart_type(&self) -> ChartType {
        match self {
            ChartDto::Line(_) => ChartType::Line,
            ChartDto::Bar(_) => ChartType::Bar,
            ChartDto::Box(_) => ChartType::Box,
            ChartDto::Histogram(_) => ChartType::Histogram,
            ChartDto::Scatter(_) => ChartType::Scatter,
            ChartDto::Pie(_) => ChartType::Pie,
            ChartDto::Radar(_) => ChartType::Radar,
            ChartDto::Waterfall(_) => ChartType::Waterfall,
            ChartDto::Area(_) => ChartType::Area,
        }
    }

    pub fn metadata(&self) -> &ChartMetadata {
        match self {
            ChartDto::Line(c) => &c.metadata,
            ChartDto::Bar(c) => &c.metadata,
            ChartDto::Box(c) => &c.metadata,
            ChartDto::Histogram(c) => &c.metadata,
            ChartDto::Scatter(c) => &c.metadata,
            ChartDto::Pie(c) => &c.metadata,
            ChartDto::Radar(c) => &c.metadata,
            ChartDto::Waterfall(c) => &c.metadata,
            ChartDto::Area(c) => &c.metadata,
        }
    }

    /// Series payload, empty for record-based charts.
    pub fn series(&self) -> &[ChartSeries] {
        match self {
            ChartDto::Line(c) => &c.series,
            ChartDto::Bar(c) => &c.series,
            ChartDto::Area(c) => &c.series,
            ChartDto::Scatter(c) => &c.series,
            ChartDto::Radar(c) => &c.series,
            ChartDto::Box(_) | ChartDto::Histogram(_) | ChartDto::Pie(_) | ChartDto::Waterfall(_) => {
                &[]
            }
        }
    }
}

/// Generic statistical test result. Never produced by this engine today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTestResult {
    pub test_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significance_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResponse {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub charts: Vec<ChartDto>,
    #[serde(default)]
    pub stats: Vec<StatisticalTestResult>,
    pub timestamp: DateTime<Utc>,
}

impl VisualizationResponse {
    pub fn new(charts: Vec<ChartDto>) -> Self {
        Self {
            schema_version: default_schema_version(),
            charts,
            stats: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}
