//! Bounded-concurrency dispatch of one batch of backend queries.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{EngineError, EngineResult, ErrorContext};
use crate::graphql::{query_fingerprint, MetricsClient, MetricsQueryResponse};

/// `(completed, total)` progress observer.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// What to do when one query task faults (client `Err` or panicked task).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Abort in-flight siblings and fail the whole execution.
    #[default]
    Abort,
    /// Log the fault and treat the combination as a null response.
    Degrade,
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPolicy::Abort => write!(f, "abort"),
            FaultPolicy::Degrade => write!(f, "degrade"),
        }
    }
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FaultPolicy::Abort),
            "degrade" => Ok(FaultPolicy::Degrade),
            _ => Err(format!(
                "Unknown fault policy: {}. Valid options: abort, degrade",
                s
            )),
        }
    }
}

/// One query of a batch, with the combination labels used in logs.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    pub query: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ConcurrentExecutor {
    max_concurrency: usize,
    fault_policy: FaultPolicy,
}

impl ConcurrentExecutor {
    /// Caps are clamped to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(max_concurrency: usize, fault_policy: FaultPolicy) -> Self {
        Self {
            max_concurrency: max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
            fault_policy,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every query and wait for the whole batch.
    ///
    /// Results come back in issuance order; `progress` is called once with
    /// `(0, total)` before dispatch and then once per finished task, in
    /// completion order.
    pub async fn dispatch(
        &self,
        client: Arc<dyn MetricsClient>,
        session_scope: &str,
        queries: Vec<PendingQuery>,
        progress: Option<&ProgressFn>,
    ) -> EngineResult<Vec<Option<MetricsQueryResponse>>> {
        let total = queries.len();
        if let Some(report) = progress {
            report(0, total);
        }
        if total == 0 {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.min(total)));
        let scope: Arc<str> = Arc::from(session_scope);
        let mut join_set: JoinSet<(usize, String, EngineResult<Option<MetricsQueryResponse>>)> =
            JoinSet::new();

        for (index, pending) in queries.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let client = Arc::clone(&client);
            let scope = Arc::clone(&scope);
            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (
                            index,
                            pending.label,
                            Err(EngineError::internal(format!("Semaphore error: {}", e))),
                        )
                    }
                };
                log::info!(
                    "Dispatching query {} [{}] (labels: {})",
                    index + 1,
                    query_fingerprint(&pending.query),
                    if pending.label.is_empty() { "(none)" } else { pending.label.as_str() }
                );
                log::debug!("Query text: {}", pending.query);
                let result = client.query(&pending.query, &scope).await;
                (index, pending.label, result)
            });
        }

        let mut results: Vec<Option<MetricsQueryResponse>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        while let Some(joined) = join_set.join_next().await {
            completed += 1;
            let fault = match joined {
                Ok((index, _, Ok(response))) => {
                    results[index] = response;
                    None
                }
                Ok((_, label, Err(err))) => Some(err.with_combination(label)),
                Err(join_err) => Some(
                    EngineError::task_fault(join_err.to_string())
                        .with_context(ErrorContext::new("dispatch_batch")),
                ),
            };

            if let Some(err) = fault {
                match self.fault_policy {
                    FaultPolicy::Abort => {
                        log::error!("Query task faulted, aborting batch: {}", err);
                        join_set.abort_all();
                        return Err(err);
                    }
                    FaultPolicy::Degrade => {
                        log::error!("Query task faulted, continuing without it: {}", err);
                    }
                }
            }

            if let Some(report) = progress {
                report(completed, total);
            }
        }

        Ok(results)
    }
}
