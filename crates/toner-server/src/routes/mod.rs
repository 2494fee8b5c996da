pub mod consumables;
pub mod dashboard;
pub mod health;
pub mod locations;
pub mod models;
pub mod operations;
pub mod printers;
pub mod reports;

use std::str::FromStr;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(dashboard::routes())
        .merge(consumables::routes())
        .merge(operations::routes())
        .merge(printers::routes())
        .merge(locations::routes())
        .merge(models::routes())
        .merge(reports::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse an id from a path segment, with or without its display prefix.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
}
