use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use toner_core::{reference::DEFAULT_MAX_REFILLS, ConsumableModel};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/models", get(list_models).post(create_model))
}

async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<ConsumableModel>>, ApiError> {
    Ok(Json(state.catalog.models()?))
}

fn default_max_refills() -> u32 {
    DEFAULT_MAX_REFILLS
}

#[derive(Debug, Deserialize)]
pub struct CreateModel {
    name: String,
    manufacturer: String,
    #[serde(default)]
    compatible_printers: String,
    #[serde(default = "default_max_refills")]
    max_refills: u32,
    #[serde(default)]
    refill_instructions: String,
}

async fn create_model(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<CreateModel>,
) -> Result<(StatusCode, Json<ConsumableModel>), ApiError> {
    state.check_write(addr)?;

    let mut model = ConsumableModel::new(form.name, form.manufacturer, form.max_refills);
    model.compatible_printers = form.compatible_printers;
    model.refill_instructions = form.refill_instructions;

    let model = state.catalog.save_model(model)?;
    tracing::info!(user = %user, model = %model.id, name = %model, "model added");
    Ok((StatusCode::CREATED, Json(model)))
}
