//! Finding routes: filtered listing and status transitions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::finding::Finding;
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::finding::{self as finding_service, FindingFilters, StatusUpdateRequest};
use crate::AppState;

/// GET /api/v1/findings — list findings with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<FindingFilters>,
) -> Result<Json<ApiResponse<PagedResult<Finding>>>, AppError> {
    let findings = finding_service::query(&state.jobs, &filters);
    Ok(ApiResponse::success(PagedResult::paginate(
        findings,
        &pagination,
    )))
}

/// PATCH /api/v1/findings/{id}/status — user-driven status transition.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<ApiResponse<Finding>>, AppError> {
    let finding = finding_service::update_status(&state.jobs, id, &body)?;
    Ok(ApiResponse::success(finding))
}
