use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use toner_core::{
    Applied, BulkReport, BulkTransition, Condition, Consumable, ConsumableDetail,
    ConsumableFilter, ConsumableId, ConsumableKind, ConsumableStatus, LocationId, ModelId,
    NewConsumable,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::routes::parse_id;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/consumables", get(list_consumables).post(register_consumable))
        .route("/api/consumables/send-to-service", post(send_to_service))
        .route("/api/consumables/{id}", get(get_consumable))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    kind: Option<ConsumableKind>,
    status: Option<ConsumableStatus>,
    condition: Option<Condition>,
    model: Option<ModelId>,
    location: Option<LocationId>,
}

impl From<ListQuery> for ConsumableFilter {
    fn from(q: ListQuery) -> Self {
        ConsumableFilter {
            kind: q.kind,
            statuses: q.status.into_iter().collect(),
            conditions: q.condition.into_iter().collect(),
            model: q.model,
            location: q.location,
        }
    }
}

async fn list_consumables(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Consumable>>, ApiError> {
    let filter = ConsumableFilter::from(query);
    Ok(Json(state.tracker.list(&filter)?))
}

async fn register_consumable(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(new): Json<NewConsumable>,
) -> Result<(StatusCode, Json<Applied>), ApiError> {
    state.check_write(addr)?;
    let applied = state.tracker.register(&user, new)?;
    Ok((StatusCode::CREATED, Json(applied)))
}

async fn get_consumable(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConsumableDetail>, ApiError> {
    let id: ConsumableId = parse_id(&id)?;
    Ok(Json(state.tracker.detail(id)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SendToServiceRequest {
    /// Defaults to consumables needing repair that are in stock or installed.
    #[serde(default)]
    filter: Option<ConsumableFilter>,
    #[serde(default)]
    reason: Option<String>,
}

async fn send_to_service(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SendToServiceRequest>,
) -> Result<Json<BulkReport>, ApiError> {
    state.check_write(addr)?;
    let filter = request
        .filter
        .unwrap_or_else(ConsumableFilter::needs_repair_in_use);

    let bulk = BulkTransition::new(&state.tracker, state.catalog.resolver());
    let report = bulk.send_to_service(&user, &filter, request.reason.as_deref())?;
    Ok(Json(report))
}
