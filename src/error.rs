//! Unified error types for the gateway.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Hosted store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// DoorLoop API error.
    #[error("doorloop error: {0}")]
    Doorloop(#[from] DoorloopError),

    /// Guesty API error.
    #[error("guesty error: {0}")]
    Guesty(#[from] GuestyError),

    /// Session/authentication error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP client construction or transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of store failures, as reported by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreErrorKind {
    /// SUPABASE_URL or SUPABASE_KEY absent.
    MissingCredentials,
    /// Key rejected by the store.
    Unauthorized,
    /// Table or function does not exist.
    TableNotFound,
    /// A configured column does not exist.
    ColumnNotFound,
    /// Store could not be reached.
    Unreachable,
    /// Store answered with something we could not use.
    UnexpectedResponse,
    /// Store refused the request on its merits (e.g. bad login).
    Rejected,
}

/// Hosted store (PostgREST / auth API) errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store credentials are not configured.
    #[error("store credentials missing: SUPABASE_URL and SUPABASE_KEY must be set")]
    NotConfigured,

    /// Store rejected the API key.
    #[error("store rejected credentials for {target}: HTTP {status}")]
    Unauthorized {
        /// Table, function or endpoint being accessed.
        target: String,
        /// HTTP status returned.
        status: u16,
    },

    /// Table does not exist or is not exposed.
    #[error("table {table} not found in store")]
    TableNotFound {
        /// Missing table name.
        table: String,
    },

    /// A column named in the request does not exist (PostgREST `42703`).
    #[error("column not found in {table}: {message}")]
    ColumnNotFound {
        /// Table being read.
        table: String,
        /// Store-provided message naming the column.
        message: String,
    },

    /// Network-level failure reaching the store.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// Non-success status that fits no other class.
    #[error("unexpected store response for {target}: HTTP {status} - {body}")]
    UnexpectedResponse {
        /// Table, function or endpoint being accessed.
        target: String,
        /// HTTP status returned.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Store refused the request (invalid login and similar).
    #[error("store rejected request: {message}")]
    Rejected {
        /// HTTP status returned.
        status: u16,
        /// Store-provided message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to parse store response: {0}")]
    ParseError(String),
}

impl StoreError {
    /// Classification used by diagnostics and metrics.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotConfigured => StoreErrorKind::MissingCredentials,
            StoreError::Unauthorized { .. } => StoreErrorKind::Unauthorized,
            StoreError::TableNotFound { .. } => StoreErrorKind::TableNotFound,
            StoreError::ColumnNotFound { .. } => StoreErrorKind::ColumnNotFound,
            StoreError::Unreachable(_) => StoreErrorKind::Unreachable,
            StoreError::UnexpectedResponse { .. } | StoreError::ParseError(_) => {
                StoreErrorKind::UnexpectedResponse
            }
            StoreError::Rejected { .. } => StoreErrorKind::Rejected,
        }
    }

    /// Whether this failure stems from deployment configuration rather than
    /// from the data itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.kind(),
            StoreErrorKind::MissingCredentials
                | StoreErrorKind::Unauthorized
                | StoreErrorKind::TableNotFound
                | StoreErrorKind::ColumnNotFound
                | StoreErrorKind::Unreachable
        )
    }
}

/// DoorLoop API errors.
#[derive(Error, Debug)]
pub enum DoorloopError {
    /// DOORLOOP_API_KEY is not set.
    #[error("DoorLoop API token not configured")]
    NotConfigured,

    /// Requested resource does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable resource description.
        resource: String,
    },

    /// Non-success status from DoorLoop.
    #[error("DoorLoop returned HTTP {status} for {path}")]
    Upstream {
        /// Request path.
        path: String,
        /// HTTP status returned.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// DoorLoop served an HTML page instead of JSON (usually a login page).
    #[error("DoorLoop returned HTML for {path} (likely login page)")]
    HtmlResponse {
        /// Request path.
        path: String,
    },

    /// Network-level failure.
    #[error("DoorLoop unreachable: {0}")]
    Unreachable(String),

    /// Response body could not be decoded.
    #[error("failed to parse DoorLoop response: {0}")]
    ParseError(String),
}

/// Guesty Open API errors.
#[derive(Error, Debug)]
pub enum GuestyError {
    /// GUESTY_CLIENT_ID or GUESTY_SECRET is not set.
    #[error("Guesty credentials not configured")]
    NotConfigured,

    /// The OAuth token request failed.
    #[error("Guesty token request failed: HTTP {status} - {body}")]
    Token {
        /// HTTP status returned.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Token response carried no access token.
    #[error("no access_token in Guesty token response")]
    MissingAccessToken,

    /// Non-success status from the API.
    #[error("Guesty returned HTTP {status} for {path}")]
    Upstream {
        /// Request path.
        path: String,
        /// HTTP status returned.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Network-level failure.
    #[error("Guesty unreachable: {0}")]
    Unreachable(String),

    /// Response body could not be decoded.
    #[error("failed to parse Guesty response: {0}")]
    ParseError(String),
}

/// Session token and login errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// SECRET_KEY is not set.
    #[error("SECRET_KEY not configured")]
    SecretNotConfigured,

    /// JWT_ALGORITHM names an algorithm we cannot use with a shared secret.
    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Authorization header absent or not a bearer token.
    #[error("token missing or invalid")]
    MissingToken,

    /// Token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Login rejected.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
