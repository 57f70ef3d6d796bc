//! Scan routes: submission, status polling, progress, cancellation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::job::{JobProgress, ScanJob};
use crate::services::orchestrator::{self, CancelResponse, ScanAccepted, ScanRequest};
use crate::AppState;

/// POST /api/v1/scans — accept a scan and return before any tool runs.
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScanAccepted>>), AppError> {
    let accepted = orchestrator::submit(&state, &body)?;
    Ok((StatusCode::ACCEPTED, ApiResponse::success(accepted)))
}

/// GET /api/v1/scans/{id} — full job record.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScanJob>>, AppError> {
    let job = state
        .jobs
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(ApiResponse::success(job))
}

/// GET /api/v1/scans/{id}/progress — coarse, best-effort progress.
pub async fn progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobProgress>>, AppError> {
    let job = state
        .jobs
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(ApiResponse::success(JobProgress::from_job(&job)))
}

/// POST /api/v1/scans/{id}/cancel — best-effort cancellation.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CancelResponse>>, AppError> {
    let response = orchestrator::cancel(&state, id)?;
    Ok(ApiResponse::success(response))
}
