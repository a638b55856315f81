//! Handlers under `/api/doorloop`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::info;
use utoipa::IntoParams;

use crate::doorloop::types::{DateWindow, ServiceHealth};
use crate::doorloop::{self, clean_id, unique_ids, LeaseOccupancy, OccupancyRate, UnitDetail, UnitsSummary};
use crate::error::GatewayError;
use crate::occupancy::{format_iso_date, month_bounds, unit_occupancy, DateRange};

use super::error::ErrorBody;
use super::handlers::{required, AppState};
use super::records::date_range;

/// Service label reported by the DoorLoop health endpoint.
pub const SERVICE_NAME: &str = "DoorLoop Occupancy Rate API";

#[derive(Debug, Deserialize, IntoParams)]
pub struct UnitsQuery {
    /// DoorLoop property id.
    pub property_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeasesQuery {
    /// DoorLoop property id.
    pub property_id: Option<String>,
    /// First day (`YYYY-MM-DD`); requires `end_date`.
    pub start_date: Option<String>,
    /// Last day (`YYYY-MM-DD`); requires `start_date`.
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OccupancyQuery {
    /// First day; defaults to the start of the current month.
    pub date_from: Option<String>,
    /// Last day; defaults to the end of the current month.
    pub date_to: Option<String>,
    /// Restrict to one property.
    pub property_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Liveness of the DoorLoop routes. Does not call DoorLoop.
#[utoipa::path(get, path = "/api/doorloop/health", tag = "doorloop", responses((status = 200, body = ServiceHealth)))]
pub async fn health() -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// All DoorLoop properties, passed through.
#[utoipa::path(
    get,
    path = "/api/doorloop/properties",
    tag = "doorloop",
    responses((status = 200, body = Object), (status = 502, body = ErrorBody), (status = 503, body = ErrorBody))
)]
pub async fn properties(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.doorloop()?.properties().await?))
}

/// One DoorLoop property, passed through.
#[utoipa::path(
    get,
    path = "/api/doorloop/properties/{property_id}",
    tag = "doorloop",
    params(("property_id" = String, Path, description = "DoorLoop property id")),
    responses((status = 200, body = Object), (status = 404, body = ErrorBody), (status = 502, body = ErrorBody))
)]
pub async fn property(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let id = clean_id(&property_id);
    Ok(Json(state.doorloop()?.property(id).await?))
}

/// Distinct unit ids of a property.
#[utoipa::path(
    get,
    path = "/api/doorloop/units",
    tag = "doorloop",
    params(UnitsQuery),
    responses((status = 200, body = UnitsSummary), (status = 400, body = ErrorBody), (status = 502, body = ErrorBody))
)]
pub async fn units(
    State(state): State<AppState>,
    Query(query): Query<UnitsQuery>,
) -> Result<Json<UnitsSummary>, GatewayError> {
    let property_id = required(query.property_id, "property_id")?;
    let property_id = clean_id(&property_id).to_string();

    let rows = state.doorloop()?.units_for_property(&property_id).await?;
    let ids = unique_ids(&rows);

    info!(property_id = %property_id, units = ids.len(), returned = rows.len(), "Listed units");

    Ok(Json(UnitsSummary {
        success: true,
        num_of_units: ids.len(),
        property_id,
        units: ids.into_iter().collect(),
        total_units_returned: rows.len(),
    }))
}

/// One DoorLoop unit.
#[utoipa::path(
    get,
    path = "/api/doorloop/units/{unit_id}",
    tag = "doorloop",
    params(("unit_id" = String, Path, description = "DoorLoop unit id")),
    responses((status = 200, body = UnitDetail), (status = 404, body = ErrorBody), (status = 502, body = ErrorBody))
)]
pub async fn unit(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Result<Json<UnitDetail>, GatewayError> {
    let unit_id = clean_id(&unit_id).to_string();
    let data = state.doorloop()?.unit(&unit_id).await?;

    Ok(Json(UnitDetail {
        success: true,
        unit_id,
        data,
    }))
}

/// Per-unit occupancy percentages of a property's leases.
#[utoipa::path(
    get,
    path = "/api/doorloop/leases",
    tag = "doorloop",
    params(LeasesQuery),
    responses((status = 200, body = LeaseOccupancy), (status = 400, body = ErrorBody), (status = 502, body = ErrorBody))
)]
pub async fn leases(
    State(state): State<AppState>,
    Query(query): Query<LeasesQuery>,
) -> Result<Json<LeaseOccupancy>, GatewayError> {
    let property_id = required(query.property_id, "property_id")?;
    let property_id = clean_id(&property_id).to_string();

    let range = match (non_blank(query.start_date), non_blank(query.end_date)) {
        (Some(start), Some(end)) => Some(date_range(&start, &end)?),
        (None, None) => None,
        _ => {
            return Err(GatewayError::InvalidRequest(
                "start_date and end_date must be given together".to_string(),
            ))
        }
    };

    let leases = state.doorloop()?.leases_for_property(&property_id).await?;
    let units = unit_occupancy(&leases, range);

    Ok(Json(LeaseOccupancy {
        success: true,
        property_id,
        date_range: range.map(|r| DateWindow {
            date_from: format_iso_date(r.start),
            date_to: format_iso_date(r.end),
        }),
        leases_considered: leases.len(),
        units,
    }))
}

/// Occupancy rate of one property or of the whole portfolio.
#[utoipa::path(
    get,
    path = "/api/doorloop/occupancy-rate-doorloop",
    tag = "doorloop",
    params(OccupancyQuery),
    responses(
        (status = 200, body = OccupancyRate),
        (status = 400, body = ErrorBody),
        (status = 502, body = ErrorBody),
        (status = 503, body = ErrorBody),
    )
)]
pub async fn occupancy_rate(
    State(state): State<AppState>,
    Query(query): Query<OccupancyQuery>,
) -> Result<Json<OccupancyRate>, GatewayError> {
    let client = state.doorloop()?;

    let range = match (non_blank(query.date_from), non_blank(query.date_to)) {
        (Some(from), Some(to)) => date_range(&from, &to)?,
        _ => current_month(),
    };

    let rate = match non_blank(query.property_id) {
        Some(property_id) => doorloop::property_occupancy(client, clean_id(&property_id), range).await?,
        None => doorloop::overall_occupancy(client, range).await?,
    };

    Ok(Json(rate))
}

fn current_month() -> DateRange {
    let (start, end) = month_bounds(OffsetDateTime::now_utc().date());
    DateRange { start, end }
}
