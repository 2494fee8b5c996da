use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use toner_core::{Location, LocationType, OperationType};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/locations", get(list_locations).post(create_location))
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    /// Restrict to valid destinations for this operation type.
    operation_type: Option<OperationType>,
}

async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = match query.operation_type {
        Some(op) => state.catalog.locations_for(op)?,
        None => state.catalog.locations()?,
    };
    Ok(Json(locations))
}

#[derive(Debug, Deserialize)]
pub struct CreateLocation {
    name: String,
    #[serde(rename = "type")]
    location_type: LocationType,
    #[serde(default)]
    contact_person: String,
    #[serde(default)]
    phone: String,
}

async fn create_location(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<CreateLocation>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    state.check_write(addr)?;

    let location =
        Location::new(form.name, form.location_type).with_contact(form.contact_person, form.phone);
    let location = state.catalog.save_location(location)?;
    tracing::info!(user = %user, location = %location.id, name = %location.name, "location added");
    Ok((StatusCode::CREATED, Json(location)))
}
