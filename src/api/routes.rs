//! HTTP API route definitions.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::metrics;

use super::docs::ApiDoc;
use super::handlers::{db_health_check, health, units_for_property, welcome, AppState};
use super::{auth, doorloop, guesty, records};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin_list());

    Router::new()
        .route("/", get(welcome))
        // Status endpoints
        .route("/health", get(health))
        .route("/db/health-check", get(db_health_check))
        // Store reads
        .route("/db/units-for-property", get(units_for_property))
        .route("/api/reservations", get(records::reservations))
        .route("/api/reservations/", get(records::reservations))
        .route("/api/reservations/names", get(records::reservation_names))
        .route("/api/properties/listings", get(records::listings))
        .route("/api/longterm-unittype-filter", get(records::longterm_filter))
        .route("/api/longterm-unittype-filter/", get(records::longterm_filter))
        .nest("/api/doorloop", doorloop_router())
        // Guesty proxy
        .route("/api/guesty/listings", get(guesty::listings))
        .route("/api/guesty/reservations", get(guesty::reservations))
        .route("/api/guesty/users", get(guesty::users))
        // Sessions
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route_layer(middleware::from_fn(track_latency))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn doorloop_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(doorloop::health))
        .route("/properties", get(doorloop::properties))
        .route("/properties/:property_id", get(doorloop::property))
        .route("/units", get(doorloop::units))
        .route("/units/:unit_id", get(doorloop::unit))
        .route("/leases", get(doorloop::leases))
        .route("/occupancy-rate-doorloop", get(doorloop::occupancy_rate))
}

/// CORS for the dashboard origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn track_latency(matched: Option<MatchedPath>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = matched.map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;
    metrics::record_http_latency(start, &endpoint, response.status().as_u16());
    response
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
