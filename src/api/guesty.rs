//! Handlers under `/api/guesty`.

use axum::{extract::State, Json};
use serde_json::Value;

use crate::error::GatewayError;
use crate::guesty::GuestyResource;

use super::error::ErrorBody;
use super::handlers::AppState;

async fn proxy(state: &AppState, resource: GuestyResource) -> Result<Json<Value>, GatewayError> {
    Ok(Json(state.guesty()?.fetch(resource).await?))
}

/// First listing, as Guesty returns it.
#[utoipa::path(
    get,
    path = "/api/guesty/listings",
    tag = "guesty",
    responses((status = 200, body = Object), (status = 502, body = ErrorBody), (status = 503, body = ErrorBody))
)]
pub async fn listings(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    proxy(&state, GuestyResource::Listings).await
}

#[utoipa::path(
    get,
    path = "/api/guesty/reservations",
    tag = "guesty",
    responses((status = 200, body = Object), (status = 502, body = ErrorBody), (status = 503, body = ErrorBody))
)]
pub async fn reservations(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    proxy(&state, GuestyResource::Reservations).await
}

#[utoipa::path(
    get,
    path = "/api/guesty/users",
    tag = "guesty",
    responses((status = 200, body = Object), (status = 502, body = ErrorBody), (status = 503, body = ErrorBody))
)]
pub async fn users(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    proxy(&state, GuestyResource::Users).await
}
