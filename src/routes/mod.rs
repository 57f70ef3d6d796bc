//! Route definitions for the scanforge API.

pub mod findings;
pub mod health;
pub mod policies;
pub mod scans;
pub mod targets;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router. Shared by `main` and the
/// integration tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/scans", post(scans::submit))
        .route("/scans/{id}", get(scans::get_by_id))
        .route("/scans/{id}/progress", get(scans::progress))
        .route("/scans/{id}/cancel", post(scans::cancel))
        .route("/findings", get(findings::list))
        .route("/findings/{id}/status", patch(findings::update_status))
        .route("/targets", get(targets::list).post(targets::create))
        .route(
            "/targets/{id}",
            get(targets::get_by_id)
                .put(targets::update)
                .delete(targets::delete),
        )
        .route("/policies", get(policies::list).post(policies::create))
        .route(
            "/policies/{id}",
            get(policies::get_by_id)
                .put(policies::update)
                .delete(policies::delete),
        );

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
