use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use toner_core::{Applied, Operation, OperationRequest};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 500;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/operations", get(recent_operations).post(submit_operation))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

async fn recent_operations(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Operation>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(MAX_RECENT_LIMIT);
    Ok(Json(state.tracker.recent_operations(limit)?))
}

async fn submit_operation(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<OperationRequest>,
) -> Result<(StatusCode, Json<Applied>), ApiError> {
    state.check_write(addr)?;
    let applied = state.tracker.submit(&user, request)?;
    Ok((StatusCode::CREATED, Json(applied)))
}
