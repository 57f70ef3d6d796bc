//! Policy CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::policy::{CreatePolicy, ScanPolicy, UpdatePolicy};
use crate::services::policy as policy_service;
use crate::AppState;

/// GET /api/v1/policies
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ScanPolicy>>>, AppError> {
    Ok(ApiResponse::success(policy_service::list(&state.policies)))
}

/// POST /api/v1/policies
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePolicy>,
) -> Result<(StatusCode, Json<ApiResponse<ScanPolicy>>), AppError> {
    let policy = policy_service::create(&state.policies, &body)?;
    Ok((StatusCode::CREATED, ApiResponse::success(policy)))
}

/// GET /api/v1/policies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScanPolicy>>, AppError> {
    Ok(ApiResponse::success(policy_service::get(
        &state.policies,
        id,
    )?))
}

/// PUT /api/v1/policies/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePolicy>,
) -> Result<Json<ApiResponse<ScanPolicy>>, AppError> {
    Ok(ApiResponse::success(policy_service::update(
        &state.policies,
        id,
        &body,
    )?))
}

/// DELETE /api/v1/policies/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    policy_service::delete(&state.policies, id)?;
    Ok(StatusCode::NO_CONTENT)
}
