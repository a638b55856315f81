//! Mapping of gateway errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::Display;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::error::{AuthError, DoorloopError, GatewayError, GuestyError, StoreError};

/// Error class reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Deployment problem: credentials, connectivity, missing tables.
    Configuration,
    /// Upstream service failed or answered unusably.
    Upstream,
    /// Requested resource does not exist upstream.
    NotFound,
    /// Request parameters failed validation.
    InvalidRequest,
    /// Missing or rejected credentials from the caller.
    Unauthorized,
    Internal,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    pub kind: ErrorKind,
    /// Underlying cause, when it adds information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn store_status(e: &StoreError) -> (StatusCode, ErrorKind) {
    match e {
        e if e.is_configuration() => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Configuration),
        StoreError::Rejected { .. } => (StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized),
        _ => (StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
    }
}

fn doorloop_status(e: &DoorloopError) -> (StatusCode, ErrorKind) {
    match e {
        DoorloopError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Configuration),
        DoorloopError::NotFound { .. } => (StatusCode::NOT_FOUND, ErrorKind::NotFound),
        DoorloopError::Upstream { .. }
        | DoorloopError::HtmlResponse { .. }
        | DoorloopError::Unreachable(_)
        | DoorloopError::ParseError(_) => (StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
    }
}

fn guesty_status(e: &GuestyError) -> (StatusCode, ErrorKind) {
    match e {
        GuestyError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Configuration),
        GuestyError::Token { .. }
        | GuestyError::MissingAccessToken
        | GuestyError::Upstream { .. }
        | GuestyError::Unreachable(_)
        | GuestyError::ParseError(_) => (StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
    }
}

fn auth_status(e: &AuthError) -> (StatusCode, ErrorKind) {
    match e {
        AuthError::SecretNotConfigured | AuthError::UnsupportedAlgorithm(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Configuration)
        }
        AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::InvalidCredentials(_) => {
            (StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized)
        }
    }
}

impl GatewayError {
    /// HTTP status and client-facing class.
    pub fn classify(&self) -> (StatusCode, ErrorKind) {
        match self {
            GatewayError::Store(e) => store_status(e),
            GatewayError::Doorloop(e) => doorloop_status(e),
            GatewayError::Guesty(e) => guesty_status(e),
            GatewayError::Auth(e) => auth_status(e),
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest),
            GatewayError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Configuration),
            GatewayError::Http(_) => (StatusCode::BAD_GATEWAY, ErrorKind::Upstream),
            GatewayError::Json(_) | GatewayError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
        }
    }

    fn headline(&self) -> String {
        match self {
            GatewayError::Store(e) if e.is_configuration() => "Store is not correctly configured".to_string(),
            GatewayError::Store(StoreError::Rejected { .. }) => "Invalid credentials".to_string(),
            GatewayError::Store(_) => "Store returned an unexpected response".to_string(),
            GatewayError::Doorloop(e @ DoorloopError::NotFound { .. }) => e.to_string(),
            GatewayError::Doorloop(DoorloopError::NotConfigured) => "DoorLoop API token not configured".to_string(),
            GatewayError::Doorloop(DoorloopError::HtmlResponse { .. }) => {
                "DoorLoop authentication failed".to_string()
            }
            GatewayError::Doorloop(_) => "Failed to fetch data from DoorLoop".to_string(),
            GatewayError::Guesty(GuestyError::NotConfigured) => "Guesty credentials not configured".to_string(),
            GatewayError::Guesty(GuestyError::Token { .. } | GuestyError::MissingAccessToken) => {
                "Failed to fetch Guesty token".to_string()
            }
            GatewayError::Guesty(GuestyError::Upstream { path, .. }) => format!("Failed to fetch {}", path),
            GatewayError::Guesty(_) => "Failed to fetch data from Guesty".to_string(),
            GatewayError::Auth(AuthError::SecretNotConfigured) => "Session signing is not configured".to_string(),
            GatewayError::Auth(AuthError::InvalidCredentials(_)) => "Invalid credentials".to_string(),
            GatewayError::Auth(_) => "Token missing or invalid".to_string(),
            GatewayError::InvalidRequest(message) => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();

        if status.is_server_error() {
            error!(kind = %kind, error = %self, "Request failed");
        } else {
            warn!(kind = %kind, error = %self, "Request rejected");
        }

        let headline = self.headline();
        let detail = match &self {
            GatewayError::InvalidRequest(_) => None,
            other => Some(other.to_string()),
        };

        let body = ErrorBody {
            error: headline,
            kind,
            detail,
        };

        (status, Json(body)).into_response()
    }
}
