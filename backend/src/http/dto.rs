//! Data Transfer Objects for the HTTP API.
//!
//! Plans and visualization responses are served with their library types;
//! only the request envelopes and job views live here.

use serde::{Deserialize, Serialize};

use crate::models::AnalysisPlan;
use crate::services::{JobProgress, LogEntry};

/// Body of `POST /v1/plans/execute` and `POST /v1/plans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutePlanRequest {
    pub plan: AnalysisPlan,
    /// Overrides the server's default concurrency cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPlanResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: crate::services::JobStatus,
    pub progress: JobProgress,
    pub logs: Vec<LogEntry>,
    /// Visualization response once completed
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub max_concurrency: usize,
}
