//! Guesty Open API client wrapper.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::GuestyError;
use crate::metrics;
use crate::utils::{build_http_client, preview};

/// OAuth scope requested for Open API tokens.
const TOKEN_SCOPE: &str = "open-api";

/// Listing reads are capped to one record, which is all the dashboard reads.
const LISTINGS_LIMIT: &str = "1";

/// Collections exposed through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum GuestyResource {
    Listings,
    Reservations,
    Users,
}

impl GuestyResource {
    fn query(self) -> Vec<(&'static str, &'static str)> {
        match self {
            GuestyResource::Listings => vec![("limit", LISTINGS_LIMIT)],
            GuestyResource::Reservations | GuestyResource::Users => Vec::new(),
        }
    }
}

/// Body of a successful `oauth2/token` call.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Guesty API client.
#[derive(Clone)]
pub struct GuestyClient {
    http: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for GuestyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestyClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl GuestyClient {
    /// Create a client from config; fails unless both Guesty credentials are set.
    pub fn from_config(config: &Config) -> Result<Self, GuestyError> {
        let (client_id, client_secret) = config.guesty_credentials().ok_or(GuestyError::NotConfigured)?;
        let http = build_http_client(config.http_timeout_ms)
            .map_err(|e| GuestyError::Unreachable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::new(http, &config.guesty_base_url, client_id, client_secret))
    }

    /// Create a client with an existing HTTP client.
    pub fn new(http: reqwest::Client, base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange the client credentials for a bearer token.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<String, GuestyError> {
        let url = format!("{}/oauth2/token", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", TOKEN_SCOPE),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                metrics::inc_guesty_requests("unreachable");
                GuestyError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GuestyError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            metrics::inc_guesty_requests("token_error");
            warn!(status = %status, body = %preview(&body), "Guesty token request failed");
            return Err(GuestyError::Token {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        let token: TokenGrant =
            serde_json::from_str(&body).map_err(|e| GuestyError::ParseError(format!("token: {}", e)))?;

        match token.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => {
                debug!(expires_in = ?token.expires_in, "Obtained Guesty token");
                Ok(access_token)
            }
            None => {
                metrics::inc_guesty_requests("token_error");
                Err(GuestyError::MissingAccessToken)
            }
        }
    }

    /// Read one collection with a freshly issued token.
    #[instrument(skip(self))]
    pub async fn fetch(&self, resource: GuestyResource) -> Result<Value, GuestyError> {
        let token = self.access_token().await?;
        let path: &'static str = resource.into();
        let url = format!("{}/v1/{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .query(&resource.query())
            .send()
            .await
            .map_err(|e| {
                metrics::inc_guesty_requests("unreachable");
                GuestyError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GuestyError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            metrics::inc_guesty_requests("error");
            warn!(status = %status, body = %preview(&body), "Guesty request failed");
            return Err(GuestyError::Upstream {
                path: path.to_string(),
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        metrics::inc_guesty_requests("ok");
        let value: Value =
            serde_json::from_str(&body).map_err(|e| GuestyError::ParseError(format!("{}: {}", path, e)))?;
        info!(resource = %resource, "Fetched Guesty collection");
        Ok(value)
    }
}
