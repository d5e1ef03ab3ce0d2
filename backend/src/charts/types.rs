//! Building blocks shared by every chart DTO.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chart kinds a plan may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartType {
    Line,
    Bar,
    Box,
    Histogram,
    Scatter,
    Pie,
    Radar,
    Waterfall,
    Area,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "LINE",
            ChartType::Bar => "BAR",
            ChartType::Box => "BOX",
            ChartType::Histogram => "HISTOGRAM",
            ChartType::Scatter => "SCATTER",
            ChartType::Pie => "PIE",
            ChartType::Radar => "RADAR",
            ChartType::Waterfall => "WATERFALL",
            ChartType::Area => "AREA",
        }
    }

    /// `"BAR"` -> `"Bar"`, used for fallback chart titles.
    pub fn title_case(&self) -> String {
        let code = self.as_str();
        let mut out = String::with_capacity(code.len());
        out.push_str(&code[..1]);
        out.push_str(&code[1..].to_ascii_lowercase());
        out
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LINE" => Ok(ChartType::Line),
            "BAR" => Ok(ChartType::Bar),
            "BOX" => Ok(ChartType::Box),
            "HISTOGRAM" => Ok(ChartType::Histogram),
            "SCATTER" => Ok(ChartType::Scatter),
            "PIE" => Ok(ChartType::Pie),
            "RADAR" => Ok(ChartType::Radar),
            "WATERFALL" => Ok(ChartType::Waterfall),
            "AREA" => Ok(ChartType::Area),
            _ => Err(format!("Unknown chart type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ChartPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, label: None }
    }
}

/// One named sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<ChartPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, data: Vec<ChartPoint>) -> Self {
        Self {
            name: name.into(),
            data,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    #[default]
    Linear,
    Logarithmic,
    Category,
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAxis {
    pub label: String,
    #[serde(rename = "type", default)]
    pub axis_type: AxisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ChartAxis {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            axis_type: AxisType::Linear,
            min_value: None,
            max_value: None,
            unit: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<ChartAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<ChartAxis>,
    #[serde(default = "default_true")]
    pub legend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ChartMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            x_axis: None,
            y_axis: None,
            legend: true,
            width: None,
            height: None,
        }
    }
}
