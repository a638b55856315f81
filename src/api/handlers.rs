//! HTTP API handlers for status and unit lookups.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::config::Config;
use crate::diagnostics::{run_health_check, HealthReport};
use crate::doorloop::DoorloopClient;
use crate::error::{DoorloopError, GatewayError, GuestyError, StoreError};
use crate::guesty::GuestyClient;
use crate::property::{self, UnitTables, UnitsLookup};
use crate::store::SupabaseClient;

use super::error::ErrorBody;

/// Greeting served at `/`.
pub const WELCOME: &str = "Hello, welcome to the Propolis Backend";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Store client; absent when SUPABASE_URL or SUPABASE_KEY is missing.
    pub store: Option<SupabaseClient>,
    /// DoorLoop client; absent when DOORLOOP_API_KEY is missing.
    pub doorloop: Option<DoorloopClient>,
    /// Guesty client; absent unless GUESTY_CLIENT_ID and GUESTY_SECRET are set.
    pub guesty: Option<GuestyClient>,
    /// Prometheus render handle, when the recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("doorloop", &self.doorloop)
            .field("guesty", &self.guesty)
            .field("prometheus", &self.prometheus.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build clients for every configured upstream.
    ///
    /// Missing credentials leave the client absent; the process still serves
    /// so the health check can report what is wrong.
    pub fn from_config(config: Config) -> Self {
        let store = match SupabaseClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Store client unavailable");
                None
            }
        };

        let doorloop = match DoorloopClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "DoorLoop client unavailable");
                None
            }
        };

        let guesty = match GuestyClient::from_config(&config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "Guesty client unavailable");
                None
            }
        };

        Self {
            config: Arc::new(config),
            store,
            doorloop,
            guesty,
            prometheus: None,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Store client or a configuration error.
    pub fn store(&self) -> Result<&SupabaseClient, StoreError> {
        self.store.as_ref().ok_or(StoreError::NotConfigured)
    }

    /// DoorLoop client or a configuration error.
    pub fn doorloop(&self) -> Result<&DoorloopClient, DoorloopError> {
        self.doorloop.as_ref().ok_or(DoorloopError::NotConfigured)
    }

    /// Guesty client or a configuration error.
    pub fn guesty(&self) -> Result<&GuestyClient, GuestyError> {
        self.guesty.as_ref().ok_or(GuestyError::NotConfigured)
    }

    /// Unit tables queried by property lookups.
    pub fn unit_tables(&self) -> UnitTables {
        UnitTables {
            tables: self.config.unit_tables().iter().map(|t| t.to_string()).collect(),
            property_column: self.config.units_property_column.clone(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status: "ok".
    #[schema(value_type = String)]
    pub status: &'static str,
}

/// Query of `/db/units-for-property`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PropertyQuery {
    /// Property name exactly as stored.
    pub property: Option<String>,
}

/// Reject a missing or blank required parameter.
pub(crate) fn required(value: Option<String>, name: &str) -> Result<String, GatewayError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GatewayError::InvalidRequest(format!("query parameter '{}' is required", name))),
    }
}

/// Welcome message.
#[utoipa::path(get, path = "/", tag = "status", responses((status = 200, body = String)))]
pub async fn welcome() -> impl IntoResponse {
    Json(WELCOME)
}

/// Health check handler - always returns 200.
#[utoipa::path(get, path = "/health", tag = "status", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Credential presence and table reachability. Always 200; failures are data.
#[utoipa::path(get, path = "/db/health-check", tag = "status", responses((status = 200, body = HealthReport)))]
pub async fn db_health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(run_health_check(&state.config, state.store.as_ref()).await)
}

/// Units whose property column equals `property`, from both unit tables.
#[utoipa::path(
    get,
    path = "/db/units-for-property",
    tag = "units",
    params(PropertyQuery),
    responses(
        (status = 200, body = UnitsLookup),
        (status = 400, body = ErrorBody),
        (status = 503, body = ErrorBody),
    )
)]
pub async fn units_for_property(
    State(state): State<AppState>,
    Query(query): Query<PropertyQuery>,
) -> Result<Json<UnitsLookup>, GatewayError> {
    let property = required(query.property, "property")?;
    let store = state.store()?;

    let lookup = property::units_for_property(store, &state.unit_tables(), &property).await?;
    Ok(Json(lookup))
}
