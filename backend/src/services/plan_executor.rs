//! Plan execution engine.
//!
//! For every chart the engine picks its server dimensions (canonical-field
//! groupings pushed to the backend, or one anonymous dimension when there are
//! none), expands every other dimension client-side into a Cartesian product of
//! categories, dispatches one query per combination and assembles the answers
//! into one chart per server dimension.
//!
//! Charts are processed strictly in plan order and each batch is fully drained
//! before the next one starts.

use std::sync::Arc;

use chrono::NaiveDate;

use super::assembler::{self, SeriesContext};
use super::dimension::Dimension;
use super::executor::{ConcurrentExecutor, FaultPolicy, PendingQuery, ProgressFn};
use super::filter_translator::{collect_date_bounds, translate_opt};
use crate::charts::{ChartDto, ChartMetadata, ChartSeries, VisualizationResponse};
use crate::error::EngineResult;
use crate::graphql::{build_query, DataOrigin, MetricRequest, MetricsClient, QueryRequest, TimePeriod};
use crate::metadata::{derive_distribution, MetadataProvider};
use crate::models::{AnalysisPlan, ChartSpec, DistributionSpec, FilterNode, ProviderGroupId};

/// Separator between combination labels in log lines and error contexts.
const COMBINATION_LABEL_SEPARATOR: &str = " | ";

/// Knobs that stay fixed for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOptions {
    pub fault_policy: FaultPolicy,
    pub include_general_stats: bool,
    /// Request descriptive statistics for every metric.
    pub include_statistics: bool,
    pub provider_group_ids: Vec<ProviderGroupId>,
    /// Window used for any side the filter does not bound.
    pub default_period: TimePeriod,
    /// Anchor for relative time windows; `None` means today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        Self {
            fault_policy: FaultPolicy::default(),
            include_general_stats: true,
            include_statistics: false,
            provider_group_ids: vec![ProviderGroupId::new(1)],
            default_period: TimePeriod::new(date(2022, 1, 1), date(2024, 12, 31)),
            reference_date: None,
        }
    }
}

/// One category picked for a client-side dimension.
#[derive(Debug, Clone)]
struct Choice {
    label: String,
    filter: Option<FilterNode>,
}

/// Per-chart data shared by all of its server dimensions.
struct PreparedChart<'a> {
    spec: &'a ChartSpec,
    metrics: Vec<MetricRequest>,
    distributions: Vec<DistributionSpec>,
    dimensions: Vec<Dimension<'a>>,
}

pub struct PlanExecutor {
    client: Arc<dyn MetricsClient>,
    metadata: Arc<dyn MetadataProvider>,
    options: ExecutionOptions,
}

impl PlanExecutor {
    pub fn new(client: Arc<dyn MetricsClient>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            client,
            metadata,
            options: ExecutionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Execute a plan and return every chart it produces.
    ///
    /// `progress` receives `(completed, total)` for each dispatched batch.
    pub async fn execute(
        &self,
        plan: &AnalysisPlan,
        session_scope: &str,
        max_concurrency: usize,
        progress: Option<&ProgressFn>,
    ) -> EngineResult<VisualizationResponse> {
        plan.validate()?;

        if !plan.statistical_tests.is_empty() {
            log::warn!(
                "Statistical tests ({}) are not supported and will be ignored",
                plan.statistical_tests.len()
            );
        }

        let executor = ConcurrentExecutor::new(max_concurrency, self.options.fault_policy);
        let today = self
            .options
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let mut charts = Vec::new();
        for spec in &plan.charts {
            log::info!("Processing chart '{}' ({})", spec.log_title(), spec.chart_type);
            let prepared = self.prepare_chart(spec, today);
            let produced = self
                .execute_chart(&prepared, &executor, session_scope, progress)
                .await
                .map_err(|e| e.with_chart(spec.log_title()))?;
            charts.extend(produced);
        }

        log::info!("Plan execution finished with {} chart(s)", charts.len());
        Ok(VisualizationResponse::new(charts))
    }

    fn prepare_chart<'a>(&self, spec: &'a ChartSpec, today: NaiveDate) -> PreparedChart<'a> {
        let mut metrics = Vec::with_capacity(spec.metrics.len());
        let mut distributions = Vec::with_capacity(spec.metrics.len());
        for metric in &spec.metrics {
            let dist = derive_distribution(self.metadata.as_ref(), &metric.metric, metric.distribution);
            let mut request = MetricRequest::new(&metric.metric).with_distribution(
                dist.num_buckets,
                dist.min_value,
                dist.max_value,
            );
            if self.options.include_statistics {
                request = request.with_stats();
            }
            metrics.push(request);
            distributions.push(dist);
        }

        let dimensions = spec
            .groupings()
            .iter()
            .map(|g| Dimension::new(g, today))
            .collect();

        PreparedChart {
            spec,
            metrics,
            distributions,
            dimensions,
        }
    }

    async fn execute_chart(
        &self,
        chart: &PreparedChart<'_>,
        executor: &ConcurrentExecutor,
        session_scope: &str,
        progress: Option<&ProgressFn>,
    ) -> EngineResult<Vec<ChartDto>> {
        let server_dims: Vec<Option<usize>> = {
            let canonical: Vec<Option<usize>> = chart
                .dimensions
                .iter()
                .enumerate()
                .filter(|(_, d)| d.is_canonical())
                .map(|(i, _)| Some(i))
                .collect();
            if canonical.is_empty() {
                vec![None]
            } else {
                canonical
            }
        };

        let mut produced = Vec::with_capacity(server_dims.len());
        for server_idx in server_dims {
            let server_field = server_idx.and_then(|i| chart.dimensions[i].server_field());

            let mut axes: Vec<Vec<Choice>> = Vec::new();
            let mut shaping: Vec<usize> = server_idx.into_iter().collect();
            for (idx, dim) in chart.dimensions.iter().enumerate() {
                if Some(idx) == server_idx {
                    continue;
                }
                let categories = dim.categories();
                if categories.is_empty() {
                    log::warn!(
                        "Skipping dimension {} for chart '{}': no enumerable categories",
                        dim.spec().kind().name(),
                        chart.spec.log_title()
                    );
                    continue;
                }
                axes.push(
                    categories
                        .iter()
                        .map(|c| Choice {
                            label: dim.label_for(c, self.metadata.as_ref()),
                            filter: dim.filter_for(c),
                        })
                        .collect(),
                );
                shaping.push(idx);
            }
            shaping.sort_unstable();

            let combinations = cartesian_product(&axes);
            let labels: Vec<Vec<String>> = combinations
                .iter()
                .map(|combo| combo.iter().map(|c| c.label.clone()).collect())
                .collect();
            let queries: Vec<PendingQuery> = combinations
                .iter()
                .zip(&labels)
                .map(|(combo, labels)| PendingQuery {
                    query: self.render_query(chart, combo, server_field),
                    label: labels.join(COMBINATION_LABEL_SEPARATOR),
                })
                .collect();

            log::info!(
                "Chart '{}': dispatching {} quer{} (groupBy={})",
                chart.spec.log_title(),
                queries.len(),
                if queries.len() == 1 { "y" } else { "ies" },
                server_field.unwrap_or("-")
            );
            let responses = executor
                .dispatch(Arc::clone(&self.client), session_scope, queries, progress)
                .await?;

            let ctx = SeriesContext {
                metrics: &chart.metrics,
                server_field,
                metadata: self.metadata.as_ref(),
            };
            let series: Vec<ChartSeries> = responses
                .iter()
                .zip(&labels)
                .flat_map(|(response, labels)| {
                    assembler::combination_series(&ctx, response.as_ref(), labels)
                })
                .collect();

            let dimension_names: Vec<String> = shaping
                .iter()
                .map(|&i| chart.dimensions[i].display_name(self.metadata.as_ref()))
                .collect();
            produced.push(self.assemble_chart(chart, &dimension_names, series));
        }
        Ok(produced)
    }

    fn render_query(
        &self,
        chart: &PreparedChart<'_>,
        combination: &[&Choice],
        server_field: Option<&str>,
    ) -> String {
        let fragments = combination
            .iter()
            .filter_map(|c| c.filter.clone())
            .collect();
        let filter = combine_filters(chart.spec.filters.as_ref(), fragments);
        let backend_filter = translate_opt(filter.as_ref());
        let (start, end) = collect_date_bounds(backend_filter.as_ref());

        let request = QueryRequest::new(
            chart.metrics.clone(),
            TimePeriod::resolve(start, end, self.options.default_period),
            DataOrigin {
                provider_group_ids: self.options.provider_group_ids.clone(),
            },
        )
        .with_case_filter(backend_filter)
        .with_group_by(server_field.map(str::to_string))
        .with_general_stats(self.options.include_general_stats);
        build_query(&request)
    }

    fn assemble_chart(
        &self,
        chart: &PreparedChart<'_>,
        dimension_names: &[String],
        series: Vec<ChartSeries>,
    ) -> ChartDto {
        let metadata = self.metadata.as_ref();
        let metric_names: Vec<String> = chart
            .metrics
            .iter()
            .map(|m| metadata.metric_display_name(&m.metric_code))
            .collect();

        let mut chart_meta = ChartMetadata::new(assembler::chart_title(
            chart.spec,
            &metric_names,
            dimension_names,
        ));
        chart_meta.description = chart.spec.description.clone();
        if let ([metric], [distribution]) = (chart.metrics.as_slice(), chart.distributions.as_slice()) {
            let (x_axis, y_axis) = assembler::derive_axes(metadata, &metric.metric_code, distribution);
            chart_meta.x_axis = Some(x_axis);
            chart_meta.y_axis = Some(y_axis);
        }

        if series.is_empty() {
            log::warn!("Chart '{}' has no series", chart_meta.title);
        }
        assembler::build_chart(&chart.spec.chart_type, chart_meta, series)
    }
}

/// Merge the chart filter with combination fragments.
///
/// No fragments keeps the chart filter; a lone fragment without a chart filter
/// is used as is; anything else becomes an AND of the chart filter (first,
/// when present) and the fragments.
fn combine_filters(chart_filter: Option<&FilterNode>, fragments: Vec<FilterNode>) -> Option<FilterNode> {
    match (chart_filter, fragments.len()) {
        (filter, 0) => filter.cloned(),
        (None, 1) => fragments.into_iter().next(),
        (filter, _) => {
            let mut children = Vec::with_capacity(fragments.len() + 1);
            children.extend(filter.cloned());
            children.extend(fragments);
            Some(FilterNode::and(children))
        }
    }
}

/// All picks of one element per axis, first axis varying slowest.
fn cartesian_product<T>(axes: &[Vec<T>]) -> Vec<Vec<&T>> {
    let mut product: Vec<Vec<&T>> = vec![Vec::new()];
    for axis in axes {
        product = product
            .iter()
            .flat_map(|prefix| {
                axis.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item);
                    next
                })
            })
            .collect();
    }
    product
}
