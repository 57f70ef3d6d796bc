//! Target CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::{ApiResponse, AppError};
use crate::models::target::{CreateTarget, ScanTarget, UpdateTarget};
use crate::services::target as target_service;
use crate::AppState;

/// GET /api/v1/targets
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ScanTarget>>>, AppError> {
    Ok(ApiResponse::success(target_service::list(&state.targets)))
}

/// POST /api/v1/targets
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateTarget>,
) -> Result<(StatusCode, Json<ApiResponse<ScanTarget>>), AppError> {
    let target = target_service::create(&state.targets, &body)?;
    Ok((StatusCode::CREATED, ApiResponse::success(target)))
}

/// GET /api/v1/targets/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScanTarget>>, AppError> {
    Ok(ApiResponse::success(target_service::get(
        &state.targets,
        id,
    )?))
}

/// PUT /api/v1/targets/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTarget>,
) -> Result<Json<ApiResponse<ScanTarget>>, AppError> {
    Ok(ApiResponse::success(target_service::update(
        &state.targets,
        id,
        &body,
    )?))
}

/// DELETE /api/v1/targets/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    target_service::delete(&state.targets, id)?;
    Ok(StatusCode::NO_CONTENT)
}
