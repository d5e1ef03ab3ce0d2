//! HTTP handlers for the REST API.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;

use super::dto::{ExecutePlanRequest, HealthResponse, JobStatusResponse, SubmitPlanResponse};
use super::error::AppError;
use super::state::AppState;
use crate::charts::VisualizationResponse;
use crate::services::{JobTracker, LogLevel, PlanExecutor};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Session scope carried by `Authorization: Bearer <token>`.
fn session_scope(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Malformed Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        max_concurrency: state.max_concurrency,
    }))
}

/// POST /v1/plans/execute
///
/// Run a plan to completion and return the visualization response.
pub async fn execute_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExecutePlanRequest>,
) -> HandlerResult<VisualizationResponse> {
    let scope = session_scope(&headers)?;
    let cap = request.max_concurrency.unwrap_or(state.max_concurrency);
    let response = state
        .executor
        .execute(&request.plan, &scope, cap, None)
        .await?;
    Ok(Json(response))
}

/// POST /v1/plans
///
/// Start a plan in the background; progress is tracked as a job.
pub async fn submit_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExecutePlanRequest>,
) -> Result<(StatusCode, Json<SubmitPlanResponse>), AppError> {
    let scope = session_scope(&headers)?;
    request.plan.validate()?;

    let job_id = state.job_tracker.create_job();
    let cap = request.max_concurrency.unwrap_or(state.max_concurrency);
    tokio::spawn(run_plan_job(
        Arc::clone(&state.executor),
        state.job_tracker.clone(),
        job_id.clone(),
        request,
        scope,
        cap,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitPlanResponse {
            message: format!("Plan execution started. Track progress at /v1/jobs/{}/logs", job_id),
            job_id,
        }),
    ))
}

async fn run_plan_job(
    executor: Arc<PlanExecutor>,
    tracker: JobTracker,
    job_id: String,
    request: ExecutePlanRequest,
    scope: String,
    cap: usize,
) {
    tracker.log(
        &job_id,
        LogLevel::Info,
        format!("Executing plan with {} chart(s)", request.plan.charts.len()),
    );
    if !request.plan.statistical_tests.is_empty() {
        tracker.log(&job_id, LogLevel::Warning, "Statistical tests are ignored");
    }

    let progress_tracker = tracker.clone();
    let progress_id = job_id.clone();
    let report = move |completed: usize, total: usize| {
        progress_tracker.set_progress(&progress_id, completed, total);
    };

    match executor.execute(&request.plan, &scope, cap, Some(&report)).await {
        Ok(response) => {
            tracker.log(
                &job_id,
                LogLevel::Success,
                format!("Plan produced {} chart(s)", response.charts.len()),
            );
            match serde_json::to_value(&response) {
                Ok(value) => tracker.complete_job(&job_id, Some(value)),
                Err(e) => tracker.fail_job(&job_id, format!("Failed to serialize result: {}", e)),
            }
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, "Plan execution failed: {}", e);
            tracker.fail_job(&job_id, e.to_string());
        }
    }
}

/// GET /v1/jobs/{job_id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        status: job.status,
        progress: job.progress,
        logs: job.logs,
        result: job.result,
    }))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events, ending with a `complete` event.
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let logs = tracker.get_logs(&job_id);
            for entry in logs.iter().skip(sent) {
                let data = serde_json::to_string(entry).unwrap_or_default();
                yield Ok(Event::default().data(data));
            }
            sent = logs.len();

            match tracker.get_job(&job_id) {
                Some(job) if job.is_finished() => {
                    let summary = serde_json::json!({
                        "status": job.status,
                        "progress": job.progress,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&summary).unwrap_or_default()));
                    break;
                }
                Some(_) => {}
                None => break,
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_scope_from_bearer() {
        assert_eq!(session_scope(&headers("Bearer abc123")).unwrap(), "abc123");
        assert!(session_scope(&headers("Basic abc")).is_err());
        assert!(session_scope(&headers("Bearer   ")).is_err());
        assert!(session_scope(&HeaderMap::new()).is_err());
    }
}
