//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::{JobTracker, PlanExecutor};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<PlanExecutor>,
    pub job_tracker: JobTracker,
    /// Cap used when a request does not set its own
    pub max_concurrency: usize,
}

impl AppState {
    pub fn new(executor: Arc<PlanExecutor>, max_concurrency: usize) -> Self {
        Self {
            executor,
            job_tracker: JobTracker::new(),
            max_concurrency: max_concurrency.max(1),
        }
    }
}
