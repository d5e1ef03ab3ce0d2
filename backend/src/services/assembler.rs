//! Turns per-combination backend responses into labeled series and charts.

use crate::charts::{
    AreaChart, BarChart, ChartAxis, ChartDto, ChartMetadata, ChartPoint, ChartSeries, ChartType,
    LineChart,
};
use crate::graphql::{MetricRequest, MetricsQueryResponse};
use crate::metadata::MetadataProvider;
use crate::models::{ChartSpec, DistributionSpec};

/// Separator between the parts of a series name.
pub const SERIES_NAME_SEPARATOR: &str = " — ";

/// Everything the assembler needs to know about one chart's queries.
pub struct SeriesContext<'a> {
    pub metrics: &'a [MetricRequest],
    /// Server-side grouping field, when pushdown is active.
    pub server_field: Option<&'a str>,
    pub metadata: &'a dyn MetadataProvider,
}

impl SeriesContext<'_> {
    fn include_metric_name(&self) -> bool {
        self.metrics.len() > 1
    }
}

/// Series contributed by one combination.
///
/// A missing response or one carrying backend errors contributes nothing.
/// Metrics are visited in request order and kpi entries without a
/// distribution are skipped.
pub fn combination_series(
    ctx: &SeriesContext<'_>,
    response: Option<&MetricsQueryResponse>,
    labels: &[String],
) -> Vec<ChartSeries> {
    let label_text = || {
        let joined = labels
            .iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" - ");
        if joined.is_empty() {
            "(none)".to_string()
        } else {
            joined
        }
    };

    let Some(response) = response else {
        log::error!(
            "Metrics backend returned no response (groupBy={}, labels={})",
            ctx.server_field.unwrap_or("-"),
            label_text()
        );
        return Vec::new();
    };
    if response.has_errors() {
        log::error!(
            "Metrics backend reported errors (groupBy={}, labels={}): {}",
            ctx.server_field.unwrap_or("-"),
            label_text(),
            response.error_messages().join("; ")
        );
        return Vec::new();
    }
    let Some(get_metrics) = response.get_metrics() else {
        return Vec::new();
    };

    let mut series = Vec::new();
    for metric in ctx.metrics {
        let Some(result) = get_metrics.metric(&metric.alias()) else {
            continue;
        };
        let display = ctx.metadata.metric_display_name(&metric.metric_code);
        for entry in &result.kpi_group {
            let Some(ref d1) = entry.kpi1.d1 else {
                continue;
            };

            let mut parts: Vec<String> = Vec::new();
            if ctx.include_metric_name() {
                parts.push(display.clone());
            }
            parts.extend(labels.iter().filter(|l| !l.is_empty()).cloned());
            if let Some(server_label) = entry
                .grouped_by
                .as_ref()
                .map(|g| g.group_item_name.as_str())
                .filter(|s| !s.is_empty())
            {
                let mapped = ctx
                    .server_field
                    .and_then(|field| ctx.metadata.category_label(field, server_label));
                parts.push(mapped.unwrap_or_else(|| server_label.to_string()));
            }

            let name = if parts.is_empty() {
                display.clone()
            } else {
                parts.join(SERIES_NAME_SEPARATOR)
            };
            let points = d1
                .edges
                .iter()
                .zip(d1.case_count.iter())
                .map(|(x, y)| ChartPoint::new(*x, *y as f64))
                .collect();
            series.push(ChartSeries::new(name, points));
        }
    }
    series
}

/// Chart title from the plan title or the metric and dimension names.
///
/// `" by A and B"` is appended when dimensions exist, unless an explicit
/// title already says `" by "`.
pub fn chart_title(spec: &ChartSpec, metric_names: &[String], dimension_names: &[String]) -> String {
    let dims_phrase = if dimension_names.is_empty() {
        String::new()
    } else {
        format!(" by {}", dimension_names.join(" and "))
    };

    if let Some(title) = spec.title.as_deref().filter(|t| !t.trim().is_empty()) {
        if dims_phrase.is_empty() || title.to_lowercase().contains(" by ") {
            return title.to_string();
        }
        return format!("{}{}", title, dims_phrase);
    }

    let base = match metric_names {
        [] => {
            let type_name = spec
                .chart_type
                .parse::<ChartType>()
                .map(|t| t.title_case())
                .unwrap_or_else(|_| crate::metadata::catalog::humanize_key(&spec.chart_type));
            format!("{} Chart", type_name)
        }
        [only] => format!("{} Distribution", only),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    };
    format!("{}{}", base, dims_phrase)
}

/// Axes for single-metric charts: the metric's range on x, case counts on y.
pub fn derive_axes(
    metadata: &dyn MetadataProvider,
    metric_code: &str,
    distribution: &DistributionSpec,
) -> (ChartAxis, ChartAxis) {
    let display = metadata.metric_display_name(metric_code);
    let unit = metadata.numeric_profile(metric_code).and_then(|p| p.unit);
    let label = match unit {
        Some(ref unit) => format!("{} ({})", display, unit),
        None => display,
    };
    let mut x_axis = ChartAxis::new(label)
        .with_range(distribution.min_value as f64, distribution.max_value as f64);
    x_axis.unit = unit;
    (x_axis, ChartAxis::new("Cases"))
}

/// Build the concrete chart for `chart_type`.
///
/// Line, bar and area are rendered natively; anything else falls back to a
/// line chart.
pub fn build_chart(chart_type: &str, metadata: ChartMetadata, series: Vec<ChartSeries>) -> ChartDto {
    match chart_type.parse::<ChartType>() {
        Ok(ChartType::Line) => ChartDto::Line(LineChart::new(metadata, series)),
        Ok(ChartType::Bar) => ChartDto::Bar(BarChart::new(metadata, series)),
        Ok(ChartType::Area) => ChartDto::Area(AreaChart::new(metadata, series)),
        _ => {
            log::warn!(
                "Chart type {} not yet implemented; defaulting to LINE rendering",
                chart_type
            );
            ChartDto::Line(LineChart::new(metadata, series))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetricCatalog, NoMetadata};
    use crate::models::MetricSpec;

    fn response(json: &str) -> MetricsQueryResponse {
        serde_json::from_str(json).unwrap()
    }

    const GROUPED: &str = r#"{"data": {"getMetrics": {
        "metric_DTN": {"kpiGroup": [
            {"kpi1": {"caseCount": [3], "d1": {"edges": [0, 10], "caseCount": [1, 2]}}, "groupedBy": {"groupItemName": "NORTH"}},
            {"kpi1": {"caseCount": [0]}, "groupedBy": {"groupItemName": "EMPTY"}},
            {"kpi1": {"caseCount": [4], "d1": {"edges": [0, 10], "caseCount": [3, 1]}}, "groupedBy": {"groupItemName": "SOUTH"}}
        ]}
    }}}"#;

    fn catalog() -> MetricCatalog {
        r#"
[[metrics]]
code = "DTN"
synonyms = ["Door-to-Needle Time"]
[metrics.numeric]
unit = "min"

[[metrics]]
code = "REGION"
options = [{ key = "NORTH", synonyms = ["North"] }]
"#
        .parse()
        .unwrap()
    }

    #[test]
    fn test_grouped_series_use_mapped_labels() {
        let catalog = catalog();
        let metrics = vec![MetricRequest::new("DTN")];
        let ctx = SeriesContext {
            metrics: &metrics,
            server_field: Some("REGION"),
            metadata: &catalog,
        };
        let series = combination_series(&ctx, Some(&response(GROUPED)), &[]);
        let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["North", "SOUTH"]);
        assert_eq!(series[0].data, vec![ChartPoint::new(0.0, 1.0), ChartPoint::new(10.0, 2.0)]);
    }

    #[test]
    fn test_name_parts_and_fallback() {
        let catalog = catalog();
        let metrics = vec![MetricRequest::new("DTN"), MetricRequest::new("AGE")];
        let ctx = SeriesContext {
            metrics: &metrics,
            server_field: None,
            metadata: &catalog,
        };
        let json = r#"{"data": {"getMetrics": {
            "metric_AGE": {"kpiGroup": [{"kpi1": {"caseCount": [1], "d1": {"edges": [18], "caseCount": [1]}}}]},
            "metric_DTN": {"kpiGroup": [{"kpi1": {"caseCount": [1], "d1": {"edges": [0], "caseCount": [1]}}}]}
        }}}"#;
        let labels = vec!["Male".to_string(), String::new(), "0-50".to_string()];
        let series = combination_series(&ctx, Some(&response(json)), &labels);
        let names: Vec<_> = series.iter().map(|s| s.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "Door-to-Needle Time — Male — 0-50".to_string(),
                "AGE — Male — 0-50".to_string()
            ]
        );

        let single = vec![MetricRequest::new("DTN")];
        let ctx = SeriesContext {
            metrics: &single,
            server_field: None,
            metadata: &catalog,
        };
        let series = combination_series(&ctx, Some(&response(json)), &[]);
        assert_eq!(series[0].name, "Door-to-Needle Time");
    }

    #[test]
    fn test_missing_or_failed_response_contributes_nothing() {
        let metrics = vec![MetricRequest::new("DTN")];
        let ctx = SeriesContext {
            metrics: &metrics,
            server_field: None,
            metadata: &NoMetadata,
        };
        assert!(combination_series(&ctx, None, &[]).is_empty());
        let failed = response(
            r#"{"data": {"getMetrics": {"metric_DTN": {"kpiGroup": [{"kpi1": {"caseCount": [1], "d1": {"edges": [0], "caseCount": [1]}}}]}}},
                "errors": [{"message": "partial"}]}"#,
        );
        assert!(combination_series(&ctx, Some(&failed), &[]).is_empty());
        assert!(combination_series(&ctx, Some(&response(r#"{"data": null}"#)), &[]).is_empty());
    }

    #[test]
    fn test_titles() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let bare = ChartSpec::new("bar", vec![MetricSpec::new("DTN")]);
        assert_eq!(chart_title(&bare, &names(&["DTN"]), &[]), "DTN Distribution");
        assert_eq!(
            chart_title(&bare, &names(&["A", "B", "C"]), &names(&["Sex", "Age"])),
            "A, B and C by Sex and Age"
        );
        assert_eq!(chart_title(&bare, &names(&["A", "B"]), &[]), "A and B");
        assert_eq!(chart_title(&bare, &[], &[]), "Bar Chart");

        let titled = bare.clone().with_title("Door to needle");
        assert_eq!(
            chart_title(&titled, &names(&["DTN"]), &names(&["Sex"])),
            "Door to needle by Sex"
        );
        let already = bare.with_title("DTN By region");
        assert_eq!(
            chart_title(&already, &names(&["DTN"]), &names(&["Sex"])),
            "DTN By region"
        );
    }

    #[test]
    fn test_axes() {
        let catalog = catalog();
        let (x, y) = derive_axes(&catalog, "DTN", &DistributionSpec::new(20, 0, 120));
        assert_eq!(x.label, "Door-to-Needle Time (min)");
        assert_eq!((x.min_value, x.max_value), (Some(0.0), Some(120.0)));
        assert_eq!(y.label, "Cases");
        let (x, _) = derive_axes(&NoMetadata, "ODT", &DistributionSpec::new(20, 0, 200));
        assert_eq!(x.label, "ODT");
    }

    #[test]
    fn test_chart_dispatch() {
        let meta = || ChartMetadata::new("t");
        assert_eq!(build_chart("BAR", meta(), vec![]).chart_type(), ChartType::Bar);
        assert_eq!(build_chart("area", meta(), vec![]).chart_type(), ChartType::Area);
        assert_eq!(build_chart("FOOBAR", meta(), vec![]).chart_type(), ChartType::Line);
        assert_eq!(build_chart("PIE", meta(), vec![]).chart_type(), ChartType::Line);
    }
}
