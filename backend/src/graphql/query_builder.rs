//! Renders a [`QueryRequest`] into the backend's query language.
//!
//! Output is normalized to single spaces, so equal requests always render to
//! byte-identical strings.

use super::request::{BackendFilter, MetricRequest, QueryRequest};

const STATS_FIELDS: &[&str] = &[
    "percents",
    "normalizedPercents",
    "cohortSize",
    "normalizedCohortSize",
    "median",
    "mean",
    "variance",
    "confidenceIntervalMean",
    "confidenceIntervalMedian",
    "interquartileRange",
    "quartiles",
];

const DISTRIBUTION_FIELDS: &str = "edges caseCount percents normalizedPercents";

const GENERAL_STATS_FIELD: &str =
    "generalStatsGroup { generalStatistics { casesInPeriod filteredCasesInPeriod } }";

pub fn build_query(request: &QueryRequest) -> String {
    let providers = request
        .data_origin
        .provider_group_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut filter_args = vec![
        format!(
            "timePeriod: {{ startDate: \"{}\", endDate: \"{}\" }}",
            request.time_period.start_date, request.time_period.end_date
        ),
        format!("dataOrigin: {{ providerGroupId: [{}] }}", providers),
    ];
    if let Some(ref filter) = request.case_filter {
        filter_args.push(format!("caseFilter: {}", render_filter(filter)));
    }

    let mut query_args = vec![format!("filter: {{ {} }}", filter_args.join(", "))];
    if let Some(ref field) = request.group_by {
        query_args.push(format!("groupBy: {}", field));
    }

    let mut fields: Vec<String> = request.metrics.iter().map(render_metric).collect();
    if request.include_general_stats {
        fields.push(GENERAL_STATS_FIELD.to_string());
    }

    normalize(&format!(
        "query {{ getMetrics({}) {{ {} }} }}",
        query_args.join(", "),
        fields.join(" ")
    ))
}

fn render_filter(filter: &BackendFilter) -> String {
    match filter {
        BackendFilter::Logical { operator, children } => {
            let children = children
                .iter()
                .map(render_filter)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{{ node: {{ logicalOperator: {}, children: [{}] }} }}",
                operator.as_str(),
                children
            )
        }
        BackendFilter::Integer {
            property,
            operator,
            value,
        } => leaf(format!(
            "integerCaseFilter: {{ property: \"{}\", operator: \"{}\", value: {} }}",
            property, operator, value
        )),
        BackendFilter::Boolean { property, value } => leaf(format!(
            "booleanCaseFilter: {{ property: \"{}\", value: {} }}",
            property.to_ascii_uppercase(),
            value
        )),
        BackendFilter::Sex { value, contains } => leaf(format!(
            "enumCaseFilter: {{ sexType: {{ values: [{}], contains: {} }} }}",
            value, contains
        )),
        BackendFilter::Stroke { value, contains } => leaf(format!(
            "enumCaseFilter: {{ strokeType: {{ values: [{}], contains: {} }} }}",
            value, contains
        )),
        BackendFilter::Date {
            property,
            operator,
            value,
        } => leaf(format!(
            "dateCaseFilter: {{ property: {}, operator: {}, value: \"{}\" }}",
            property, operator, value
        )),
    }
}

fn leaf(body: String) -> String {
    format!("{{ leaf: {{ {} }} }}", body)
}

fn render_metric(metric: &MetricRequest) -> String {
    let mut kpi_fields: Vec<String> = vec!["caseCount".to_string()];
    if metric.include_stats {
        kpi_fields.extend(STATS_FIELDS.iter().map(|f| f.to_string()));
    }
    if let Some(dist) = metric.distribution {
        kpi_fields.push(format!(
            "d1: distribution(binCount: {}) {{ {} }}",
            dist.bin_count, DISTRIBUTION_FIELDS
        ));
    }

    let mut options = Vec::new();
    if let Some(opts) = metric.options {
        if let Some(lower) = opts.lower_boundary {
            options.push(format!("lowerBoundary: {}", lower));
        }
        if let Some(upper) = opts.upper_boundary {
            options.push(format!("upperBoundary: {}", upper));
        }
    }
    let kpi_call = if options.is_empty() {
        "kpi".to_string()
    } else {
        format!("kpi(kpiOptions: {{ {} }})", options.join(", "))
    };

    let mut group_fields = vec![format!("kpi1: {} {{ {} }}", kpi_call, kpi_fields.join(" "))];
    if metric.include_grouping {
        group_fields.push("groupedBy { groupItemName }".to_string());
    }

    format!(
        "{}: metric(metricId: {}) {{ kpiGroup {{ {} }} }}",
        metric.alias(),
        metric.metric_code,
        group_fields.join(" ")
    )
}

/// Collapse every whitespace run to a single space.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
