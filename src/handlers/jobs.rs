//! Job management HTTP handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::handlers::problem_details;
use crate::job::{JobError, JobParams, JobStatus};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct StartJobRequest {
    pub id: String,
    pub job_type: String,
    #[serde(default)]
    pub params: JobParams,
}

#[derive(Serialize)]
pub struct JobsResponse {
    running: Vec<String>,
    orphaned: Vec<String>,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    id: String,
    status: JobStatus,
}

#[derive(Serialize)]
pub struct JobInfoResponse {
    id: String,
    job_type: String,
    status: JobStatus,
    params: JobParams,
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    Json(JobsResponse {
        running: state.scheduler.list().await,
        orphaned: state.scheduler.orphaned().await,
    })
}

/// POST /api/v1/jobs
pub async fn start_job(
    State(state): State<AppState>,
    Json(req): Json<StartJobRequest>,
) -> Response {
    match state
        .scheduler
        .start(&req.id, &req.job_type, req.params)
        .await
    {
        Ok(status) => (
            StatusCode::OK,
            Json(JobStatusResponse { id: req.id, status }),
        )
            .into_response(),
        Err(
            e @ (JobError::UnknownJobType(_) | JobError::InvalidId(_) | JobError::InvalidParams(_)),
        ) => problem_details::bad_request(e.to_string()),
        Err(e) => problem_details::internal_error(e.to_string()),
    }
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(info) = state.scheduler.info(&id).await else {
        return problem_details::not_found(format!("job '{id}' not found"));
    };

    (
        StatusCode::OK,
        Json(JobInfoResponse {
            id: info.id,
            job_type: info.job_type,
            status: info.status,
            params: info.params,
        }),
    )
        .into_response()
}

/// DELETE /api/v1/jobs/{id}
pub async fn stop_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    use crate::job::StopOutcome;

    match state.scheduler.stop(&id).await {
        Ok(StopOutcome::Stopped) => (
            StatusCode::OK,
            Json(JobStatusResponse {
                id,
                status: JobStatus::Stopped,
            }),
        )
            .into_response(),
        Ok(StopOutcome::NotRunning) => {
            problem_details::not_found(format!("job '{id}' is not running"))
        }
        Err(e) => problem_details::internal_error(e.to_string()),
    }
}
