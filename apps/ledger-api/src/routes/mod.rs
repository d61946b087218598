//! HTTP routes.

pub mod discounts;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/discounts", get(discounts::list).post(discounts::create))
        .route("/discounts/active", get(discounts::list_active))
        .route("/discounts/code/{code}", get(discounts::get_by_code))
        .route(
            "/discounts/{id}",
            get(discounts::get)
                .put(discounts::update)
                .delete(discounts::delete),
        )
        .route("/discounts/{id}/toggle", patch(discounts::toggle))
        .route("/discounts/{id}/usage", post(discounts::increment_usage))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
}

/// `GET /healthz`: 200 while the database answers, 503 otherwise.
async fn health(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<HealthDto>)> {
    if state.db.health_check().await {
        Ok((StatusCode::OK, Json(HealthDto { status: "ok" })))
    } else {
        Err(ApiError::new(ErrorCode::Unavailable, "Database unavailable"))
    }
}
