//! In-memory tracking of background plan executions.
//!
//! A job records its status, a timestamped log, the latest `(completed, total)`
//! progress of the batch currently in flight, and the serialized result.
//! Finished jobs are dropped once they are older than the retention window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub logs: Vec<LogEntry>,
    pub progress: JobProgress,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Serialized `VisualizationResponse` once the plan finished
    pub result: Option<serde_json::Value>,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Running
    }
}

/// How long a finished job stays queryable.
pub const DEFAULT_JOB_RETENTION_SECS: i64 = 3600;

#[derive(Clone)]
pub struct JobTracker {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    retention: Duration,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self {
            jobs: Arc::default(),
            retention: Duration::seconds(DEFAULT_JOB_RETENTION_SECS),
        }
    }
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Drop finished jobs older than the retention window; returns how many.
    pub fn prune_finished(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.completed_at.map_or(true, |done| done > cutoff));
        before - jobs.len()
    }

    /// Register a running job and return its id.
    pub fn create_job(&self) -> String {
        let pruned = self.prune_finished();
        if pruned > 0 {
            log::debug!("Pruned {} finished job(s)", pruned);
        }
        let job_id = Uuid::new_v4().to_string();
        let job = Job {
            job_id: job_id.clone(),
            status: JobStatus::Running,
            logs: Vec::new(),
            progress: JobProgress::default(),
            created_at: Utc::now(),
            completed_at: None,
            result: None,
        };
        self.jobs.write().insert(job_id.clone(), job);
        job_id
    }

    pub fn log(&self, job_id: &str, level: LogLevel, message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.logs.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Record batch progress; a new batch starts with `(0, total)`.
    pub fn set_progress(&self, job_id: &str, completed: usize, total: usize) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.progress = JobProgress { completed, total };
        }
    }

    pub fn complete_job(&self, job_id: &str, result: Option<serde_json::Value>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            job.status = JobStatus::Completed;
            job.completed_at = Some(Utc::now());
            job.result = result;
        }
    }

    pub fn fail_job(&self, job_id: &str, error_message: impl Into<String>) {
        if let Some(job) = self.jobs.write().get_mut(job_id) {
            let now = Utc::now();
            job.status = JobStatus::Failed;
            job.completed_at = Some(now);
            job.logs.push(LogEntry {
                timestamp: now,
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    pub fn get_logs(&self, job_id: &str) -> Vec<LogEntry> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| job.logs.clone())
            .unwrap_or_default()
    }
}
