use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use toner_core::{Consumable, LocationId, Printer, PrinterFilter, PrinterId, PrinterType};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::routes::parse_id;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/printers", get(list_printers).post(create_printer))
        .route("/api/printers/{id}", get(get_printer))
}

#[derive(Debug, Deserialize)]
pub struct PrinterQuery {
    /// Only active printers at this location.
    location: Option<LocationId>,
    printer_type: Option<PrinterType>,
    is_inkjet: Option<bool>,
}

impl PrinterQuery {
    fn to_filter(&self) -> PrinterFilter {
        let mut filter = PrinterFilter::new();
        if let Some(printer_type) = self.printer_type {
            filter = filter.with_type(printer_type);
        }
        if let Some(is_inkjet) = self.is_inkjet {
            filter = filter.with_inkjet(is_inkjet);
        }
        if let Some(location) = self.location {
            filter = filter.active_at(location);
        }
        filter
    }
}

async fn list_printers(
    State(state): State<AppState>,
    Query(query): Query<PrinterQuery>,
) -> Result<Json<Vec<Printer>>, ApiError> {
    Ok(Json(state.catalog.printers_matching(&query.to_filter())?))
}

#[derive(Debug, Deserialize)]
pub struct CreatePrinter {
    name: String,
    model: String,
    serial_number: String,
    printer_type: PrinterType,
    location: LocationId,
    #[serde(default)]
    is_inkjet: Option<bool>,
    #[serde(default)]
    installation_date: Option<NaiveDate>,
    #[serde(default)]
    notes: String,
}

async fn create_printer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<CreatePrinter>,
) -> Result<(StatusCode, Json<Printer>), ApiError> {
    state.check_write(addr)?;

    let mut printer = Printer::new(
        form.name,
        form.model,
        form.serial_number,
        form.printer_type,
        form.location,
    );
    if let Some(is_inkjet) = form.is_inkjet {
        printer.is_inkjet = is_inkjet;
    }
    if let Some(date) = form.installation_date {
        printer.installation_date = date;
    }
    printer.notes = form.notes;

    let printer = state.catalog.save_printer(printer)?;
    tracing::info!(user = %user, printer = %printer.id, serial = %printer.serial_number, "printer added");
    Ok((StatusCode::CREATED, Json(printer)))
}

#[derive(Serialize)]
struct PrinterDetail {
    printer: Printer,
    installed: Vec<Consumable>,
}

async fn get_printer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PrinterDetail>, ApiError> {
    let id: PrinterId = parse_id(&id)?;
    let printer = state.catalog.printer(id)?;
    let installed = state.tracker.installed_in(id)?;
    Ok(Json(PrinterDetail { printer, installed }))
}
