//! Handlers for reservation, listing and long-term lease reads.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::GatewayError;
use crate::longterm::{self, LeaseFilter, LeaseLength, LeaseReport};
use crate::occupancy::{parse_iso_date, DateRange};
use crate::reservations;
use crate::store::{Listing, ReservationPoint};

use super::error::ErrorBody;
use super::handlers::{required, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReservationQuery {
    /// Full name of the property.
    pub property_full_name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LongtermQuery {
    /// First day (`YYYY-MM-DD`).
    pub date_from: Option<String>,
    /// Last day (`YYYY-MM-DD`).
    pub date_to: Option<String>,
    /// Property name without the "Apartments" suffix.
    pub property_id: Option<String>,
    /// Unit type such as `3/3`.
    pub unit_type: Option<String>,
    /// `Long` (default) or `Short`.
    pub length: Option<String>,
    /// Restrict to one unit.
    pub unit: Option<String>,
}

/// Parse a `YYYY-MM-DD` range, rejecting reversed bounds.
pub(crate) fn date_range(from: &str, to: &str) -> Result<DateRange, GatewayError> {
    let invalid = || GatewayError::InvalidRequest("Invalid date format. Use YYYY-MM-DD".to_string());
    let start = parse_iso_date(from).map_err(|_| invalid())?;
    let end = parse_iso_date(to).map_err(|_| invalid())?;

    DateRange::new(start, end)
        .ok_or_else(|| GatewayError::InvalidRequest("date_to must not be before date_from".to_string()))
}

/// Paid reservations of a property, oldest first.
#[utoipa::path(
    get,
    path = "/api/reservations/",
    tag = "reservations",
    params(ReservationQuery),
    responses(
        (status = 200, body = Vec<ReservationPoint>),
        (status = 400, body = ErrorBody),
        (status = 503, body = ErrorBody),
    )
)]
pub async fn reservations(
    State(state): State<AppState>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<Vec<ReservationPoint>>, GatewayError> {
    let name = required(query.property_full_name, "property_full_name")?;
    let points =
        reservations::reservation_points(state.store()?, &state.config.reservations_table, &name).await?;
    Ok(Json(points))
}

/// Property names that have reservations.
#[utoipa::path(
    get,
    path = "/api/reservations/names",
    tag = "reservations",
    responses((status = 200, body = Vec<String>), (status = 503, body = ErrorBody))
)]
pub async fn reservation_names(State(state): State<AppState>) -> Result<Json<Vec<String>>, GatewayError> {
    let names = reservations::reservation_property_names(state.store()?, &state.config.reservations_table).await?;
    Ok(Json(names))
}

/// Mirrored Guesty listings.
#[utoipa::path(
    get,
    path = "/api/properties/listings",
    tag = "properties",
    responses((status = 200, body = Vec<Listing>), (status = 503, body = ErrorBody))
)]
pub async fn listings(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, GatewayError> {
    let listings = reservations::listings(state.store()?, &state.config.listings_table).await?;
    Ok(Json(listings))
}

/// Long-term leases by property and unit type, with occupancy and financial rollups.
#[utoipa::path(
    get,
    path = "/api/longterm-unittype-filter/",
    tag = "leases",
    params(LongtermQuery),
    responses(
        (status = 200, body = LeaseReport),
        (status = 400, body = ErrorBody),
        (status = 503, body = ErrorBody),
    )
)]
pub async fn longterm_filter(
    State(state): State<AppState>,
    Query(query): Query<LongtermQuery>,
) -> Result<Json<LeaseReport>, GatewayError> {
    let date_from = required(query.date_from, "date_from")?;
    let date_to = required(query.date_to, "date_to")?;
    let range = date_range(&date_from, &date_to)?;

    let length = match query.length.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(raw) => raw
            .parse::<LeaseLength>()
            .map_err(|_| GatewayError::InvalidRequest(format!("length must be Long or Short, got '{}'", raw)))?,
        None => LeaseLength::default(),
    };

    let filter = LeaseFilter {
        property: required(query.property_id, "property_id")?,
        unit_type: required(query.unit_type, "unit_type")?,
        length,
        unit: query.unit.filter(|u| !u.trim().is_empty()),
    };

    let store = state.store()?;
    let report = longterm::filter_leases(store, &state.config.leases_rpc, &filter, range).await?;
    Ok(Json(report))
}
