use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use toner_core::{reports::DashboardStats, Consumable, ConsumableFilter, Operation, Reports};

use crate::error::ApiError;
use crate::state::AppState;

const RECENT_OPERATIONS: usize = 10;
const ATTENTION_LIMIT: usize = 10;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[derive(Serialize)]
struct DashboardResponse {
    stats: DashboardStats,
    recent_operations: Vec<Operation>,
    needs_attention: Vec<Consumable>,
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let consumables = state.tracker.list(&ConsumableFilter::new())?;

    Ok(Json(DashboardResponse {
        stats: Reports::dashboard(&consumables),
        recent_operations: state.tracker.recent_operations(RECENT_OPERATIONS)?,
        needs_attention: state.tracker.needing_attention(Some(ATTENTION_LIMIT))?,
    }))
}
