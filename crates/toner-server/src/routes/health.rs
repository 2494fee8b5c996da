use axum::{extract::State, Json, Router, routing::get};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Ready once the stores answer a read.
async fn ready(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.catalog.locations()?;
    Ok(Json(HealthResponse { status: "ok" }))
}
