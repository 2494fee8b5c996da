use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use toner_core::{
    reports::{
        LocationStock, ModelStats, RefillReport, StatusCount, DEFAULT_REFILL_WINDOW_DAYS,
        MAX_REFILL_WINDOW_DAYS,
    },
    Clock, Consumable, ConsumableFilter, Reports,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/reports", get(overview))
        .route("/api/reports/stock", get(stock))
        .route("/api/reports/refills", get(refills))
}

#[derive(Serialize)]
struct OverviewResponse {
    status_breakdown: Vec<StatusCount>,
    model_stats: Vec<ModelStats>,
    over_refilled: Vec<Consumable>,
}

async fn overview(State(state): State<AppState>) -> Result<Json<OverviewResponse>, ApiError> {
    let consumables = state.tracker.list(&ConsumableFilter::new())?;
    let models = state.catalog.models()?;
    let models_by_id = state.tracker.models_by_id()?;

    Ok(Json(OverviewResponse {
        status_breakdown: Reports::status_breakdown(&consumables),
        model_stats: Reports::model_stats(&consumables, &models),
        over_refilled: Reports::over_refilled(&consumables, &models_by_id),
    }))
}

async fn stock(State(state): State<AppState>) -> Result<Json<Vec<LocationStock>>, ApiError> {
    let consumables = state.tracker.list(&ConsumableFilter::new())?;
    let locations = state.catalog.locations()?;
    let models = state.catalog.models()?;
    Ok(Json(Reports::stock_by_location(
        &consumables,
        &locations,
        &models,
    )))
}

#[derive(Debug, Deserialize)]
pub struct RefillQuery {
    days: Option<i64>,
}

async fn refills(
    State(state): State<AppState>,
    Query(query): Query<RefillQuery>,
) -> Result<Json<RefillReport>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_REFILL_WINDOW_DAYS);
    if !(1..=MAX_REFILL_WINDOW_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_REFILL_WINDOW_DAYS
        )));
    }

    let operations = state.tracker.all_operations()?;
    let consumables = state.tracker.list(&ConsumableFilter::new())?;
    let models = state.catalog.models()?;
    let now = state.tracker.clock().now();

    Ok(Json(Reports::refill_report(
        &operations,
        &consumables,
        &models,
        now,
        days,
    )))
}
