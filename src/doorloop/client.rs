//! DoorLoop REST client wrapper.

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::DoorloopError;
use crate::metrics;
use crate::utils::{build_http_client, preview};

use super::types::data_array;

/// Page size DoorLoop uses when none is requested; a shorter page is the last.
pub const PAGE_SIZE: usize = 50;

/// Hard stop for paginated listings.
pub const MAX_PAGES: u32 = 20;

/// DoorLoop API client.
#[derive(Clone)]
pub struct DoorloopClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Bearer token.
    api_key: String,
}

impl fmt::Debug for DoorloopClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoorloopClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DoorloopClient {
    /// Create a client from config; fails when DOORLOOP_API_KEY is absent.
    pub fn from_config(config: &Config) -> Result<Self, DoorloopError> {
        let api_key = config.doorloop_api_key().ok_or(DoorloopError::NotConfigured)?;
        let http = build_http_client(config.http_timeout_ms)
            .map_err(|e| DoorloopError::Unreachable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::new(http, &config.doorloop_base_url, api_key))
    }

    /// Create a client with an existing HTTP client.
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the JSON body.
    ///
    /// 404 becomes [`DoorloopError::NotFound`]; an HTML body (login page)
    /// becomes [`DoorloopError::HtmlResponse`].
    #[instrument(skip(self, query))]
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, DoorloopError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(url = %url, "DoorLoop request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| {
                metrics::inc_doorloop_requests("unreachable");
                DoorloopError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));
        let body = response
            .text()
            .await
            .map_err(|e| DoorloopError::Unreachable(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            metrics::inc_doorloop_requests("not_found");
            return Err(DoorloopError::NotFound {
                resource: path.to_string(),
            });
        }

        if !status.is_success() {
            metrics::inc_doorloop_requests("error");
            warn!(status = %status, body = %preview(&body), "DoorLoop request failed");
            return Err(DoorloopError::Upstream {
                path: path.to_string(),
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        if is_html {
            metrics::inc_doorloop_requests("html");
            return Err(DoorloopError::HtmlResponse {
                path: path.to_string(),
            });
        }

        metrics::inc_doorloop_requests("ok");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| DoorloopError::ParseError(format!("{}: {}", path, e)))
    }

    /// Every page of a listing endpoint.
    ///
    /// Stops on an empty page, a short page, or after [`MAX_PAGES`].
    pub async fn fetch_all(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Value>, DoorloopError> {
        let mut rows = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut params = query.to_vec();
            params.push(("page", page.to_string()));

            let batch = data_array(self.get_json(path, &params).await?);
            let batch_len = batch.len();
            rows.extend(batch);

            debug!(path = %path, page, batch = batch_len, total = rows.len(), "Fetched page");

            if batch_len < PAGE_SIZE {
                break;
            }
            if page == MAX_PAGES {
                warn!(path = %path, "Stopped paginating at page limit");
            }
        }

        Ok(rows)
    }

    /// All properties (raw envelope).
    pub async fn properties(&self) -> Result<Value, DoorloopError> {
        let body = self.get_json("properties", &[]).await?;
        info!(count = body.get("data").and_then(serde_json::Value::as_array).map_or(0, Vec::len), "Fetched properties");
        Ok(body)
    }

    /// One property.
    pub async fn property(&self, property_id: &str) -> Result<Value, DoorloopError> {
        self.get_json(&format!("properties/{}", property_id), &[])
            .await
            .map_err(|e| rename_not_found(e, format!("Property {}", property_id)))
    }

    /// One unit.
    pub async fn unit(&self, unit_id: &str) -> Result<Value, DoorloopError> {
        self.get_json(&format!("units/{}", unit_id), &[])
            .await
            .map_err(|e| rename_not_found(e, format!("Unit {}", unit_id)))
    }

    /// Units belonging to a property.
    pub async fn units_for_property(&self, property_id: &str) -> Result<Vec<Value>, DoorloopError> {
        let body = self
            .get_json("units", &[("filter_property", property_id.to_string())])
            .await?;
        Ok(data_array(body))
    }

    /// Leases belonging to a property.
    pub async fn leases_for_property(&self, property_id: &str) -> Result<Vec<Value>, DoorloopError> {
        let body = self
            .get_json("leases", &[("filter_property", property_id.to_string())])
            .await?;
        Ok(data_array(body))
    }
}

fn rename_not_found(error: DoorloopError, resource: String) -> DoorloopError {
    match error {
        DoorloopError::NotFound { .. } => DoorloopError::NotFound { resource },
        other => other,
    }
}
