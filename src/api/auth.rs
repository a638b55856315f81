//! Login and session endpoints.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{bearer_token, TokenIssuer};
use crate::error::{AuthError, GatewayError, StoreError};

use super::error::ErrorBody;
use super::handlers::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Session JWT.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub email: String,
}

/// Sign in against the store and issue a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = TokenResponse),
        (status = 401, body = ErrorBody),
        (status = 503, body = ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, GatewayError> {
    // SECRET_KEY must be usable before credentials go to the store
    let issuer = TokenIssuer::from_config(&state.config)?;

    match state.store()?.sign_in_with_password(&request.email, &request.password).await {
        Ok(_) => {}
        Err(StoreError::Rejected { message, .. }) => {
            warn!(email = %request.email, reason = %message, "Login rejected");
            return Err(AuthError::InvalidCredentials(message).into());
        }
        Err(e) => return Err(e.into()),
    }

    let access_token = issuer.issue(&request.email)?;
    info!(email = %request.email, "Session issued");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Identity carried by the bearer token.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses((status = 200, body = CurrentUser), (status = 401, body = ErrorBody)),
    security(("bearer" = []))
)]
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<CurrentUser>, GatewayError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;

    let claims = TokenIssuer::from_config(&state.config)?.verify(token)?;
    Ok(Json(CurrentUser { email: claims.sub }))
}
