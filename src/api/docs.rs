//! OpenAPI document served by Swagger UI.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::diagnostics::{Check, CheckKind, CheckOutcome, HealthReport};
use crate::doorloop::types::{DateWindow, LeaseOccupancy, OccupancyRate, ServiceHealth, UnitDetail, UnitsSummary};
use crate::longterm::{LeaseLength, LeaseReport};
use crate::property::lookup::{LookupDebug, TableMatch, UnitRow, UnitsLookup};
use crate::store::{Listing, ReservationPoint};

use super::auth::{CurrentUser, LoginRequest, TokenResponse};
use super::error::{ErrorBody, ErrorKind};
use super::handlers::HealthResponse;
use super::{auth, doorloop, guesty, handlers, records};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&BearerAuth),
    info(title = "Propolis Gateway", description = "Property data gateway for the Propolis dashboard"),
    paths(
        handlers::welcome,
        handlers::health,
        handlers::db_health_check,
        handlers::units_for_property,
        records::reservations,
        records::reservation_names,
        records::listings,
        records::longterm_filter,
        doorloop::health,
        doorloop::properties,
        doorloop::property,
        doorloop::units,
        doorloop::unit,
        doorloop::leases,
        doorloop::occupancy_rate,
        guesty::listings,
        guesty::reservations,
        guesty::users,
        auth::login,
        auth::me,
    ),
    components(schemas(
        HealthResponse,
        HealthReport,
        Check,
        CheckKind,
        CheckOutcome,
        UnitsLookup,
        UnitRow,
        TableMatch,
        LookupDebug,
        ReservationPoint,
        Listing,
        LeaseReport,
        LeaseLength,
        ServiceHealth,
        UnitsSummary,
        UnitDetail,
        DateWindow,
        LeaseOccupancy,
        OccupancyRate,
        LoginRequest,
        TokenResponse,
        CurrentUser,
        ErrorBody,
        ErrorKind,
    ))
)]
pub struct ApiDoc;
