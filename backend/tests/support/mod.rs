#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use plan_engine::api::{EngineError, EngineResult, MetricCatalog, MetricsClient, MetricsQueryResponse};
use plan_engine::services::ExecutionOptions;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Variables are restored on unwind and access is serialized across tests.
/// `Some(v)` sets a variable, `None` removes it.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =============================================================================
// Mock metrics backend
// =============================================================================

#[derive(Debug, Clone)]
pub enum Reply {
    Json(String),
    Null,
    Fault,
}

/// Backend double that answers by substring match and records every call.
pub struct MockClient {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    delay: Duration,
    queries: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockClient {
    pub fn new(fallback: Reply) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            delay: Duration::from_millis(5),
            queries: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Answer `reply` to queries containing `needle`; first match wins.
    pub fn on(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsClient for MockClient {
    async fn query(
        &self,
        query: &str,
        _session_scope: &str,
    ) -> EngineResult<Option<MetricsQueryResponse>> {
        self.queries.lock().unwrap().push(query.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback);
        match reply {
            Reply::Json(body) => Ok(Some(serde_json::from_str(body).unwrap())),
            Reply::Null => Ok(None),
            Reply::Fault => Err(EngineError::query_fault("mock backend fault")),
        }
    }
}

// =============================================================================
// Canned responses
// =============================================================================

fn kpi_entry(counts: &[i64], group: Option<&str>) -> serde_json::Value {
    let edges: Vec<i64> = (0..counts.len() as i64).map(|i| i * 10).collect();
    let mut entry = serde_json::json!({
        "kpi1": {
            "caseCount": [counts.iter().sum::<i64>()],
            "d1": {"edges": edges, "caseCount": counts}
        }
    });
    if let Some(name) = group {
        entry["groupedBy"] = serde_json::json!({"groupItemName": name});
    }
    entry
}

/// Ungrouped distribution for each metric code.
pub fn distribution_json(metrics: &[&str], counts: &[i64]) -> String {
    let mut get_metrics = serde_json::Map::new();
    for code in metrics {
        get_metrics.insert(
            format!("metric_{}", code),
            serde_json::json!({"kpiGroup": [kpi_entry(counts, None)]}),
        );
    }
    get_metrics.insert(
        "generalStatsGroup".to_string(),
        serde_json::json!({"generalStatistics": {"casesInPeriod": 100, "filteredCasesInPeriod": 40}}),
    );
    serde_json::json!({"data": {"getMetrics": get_metrics}}).to_string()
}

/// One grouped kpi entry per server-side group.
pub fn grouped_json(metric: &str, groups: &[&str]) -> String {
    let entries: Vec<_> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| kpi_entry(&[i as i64 + 1, 2], Some(g)))
        .collect();
    let mut get_metrics = serde_json::Map::new();
    get_metrics.insert(
        format!("metric_{}", metric),
        serde_json::json!({"kpiGroup": entries}),
    );
    serde_json::json!({"data": {"getMetrics": get_metrics}}).to_string()
}

pub fn error_json(message: &str) -> String {
    serde_json::json!({"data": null, "errors": [{"message": message}]}).to_string()
}

// =============================================================================
// Fixtures
// =============================================================================

pub const CATALOG: &str = r#"
[[metrics]]
code = "DTN"
data_type = "numeric"
synonyms = ["Door-to-Needle Time"]
[metrics.numeric]
unit = "min"
range_min = 0
range_max = 120
default_buckets = 12

[[metrics]]
code = "AGE"
data_type = "numeric"
synonyms = ["Age"]
[metrics.numeric]
unit = "years"
range_min = 18
range_max = 95
default_buckets = 10

[[group_fields]]
code = "REGION"
data_type = "enum"
synonyms = ["Region"]
options = [
    { key = "NORTH", synonyms = ["Northern Region"] },
    { key = "SOUTH", synonyms = ["Southern Region"] },
    { key = "WEST_COAST" },
]

[[sex_types]]
code = "MALE"
synonyms = ["Male"]

[[sex_types]]
code = "FEMALE"
synonyms = ["Female"]

[[stroke_types]]
code = "ISCHEMIC"
synonyms = ["Ischemic"]
"#;

pub fn catalog() -> MetricCatalog {
    CATALOG.parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Options with a fixed reference date so time buckets are reproducible.
pub fn fixed_options() -> ExecutionOptions {
    ExecutionOptions {
        reference_date: Some(date(2024, 2, 15)),
        ..ExecutionOptions::default()
    }
}
