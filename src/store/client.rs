//! Supabase REST (PostgREST + auth) client wrapper.

use std::fmt;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::StoreError;
use crate::metrics::{self, StoreTimer};
use crate::utils::{build_http_client, preview};

use super::query::Select;

/// PostgREST error codes meaning "relation does not exist".
const MISSING_RELATION_CODES: [&str; 3] = ["42P01", "PGRST205", "PGRST202"];

/// Postgres "undefined column".
const MISSING_COLUMN_CODE: &str = "42703";

/// Supabase client for table reads, RPC calls and password sign-in.
#[derive(Clone)]
pub struct SupabaseClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Project base URL without trailing slash.
    base_url: String,
    /// API key sent as `apikey` and bearer token.
    key: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Error envelope returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Error envelope returned by the auth API.
#[derive(Debug, Deserialize)]
struct AuthApiError {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl AuthApiError {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Successful password sign-in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSession {
    /// Store-issued access token.
    pub access_token: String,
    /// Token type, normally "bearer".
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl SupabaseClient {
    /// Create a client from config.
    ///
    /// Fails with [`StoreError::NotConfigured`] when URL or key is absent.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let (url, key) = match (config.supabase_url(), config.supabase_key()) {
            (Some(url), Some(key)) => (url, key),
            _ => return Err(StoreError::NotConfigured),
        };

        let http = build_http_client(config.http_timeout_ms)
            .map_err(|e| StoreError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Self::new(http, url, key)
    }

    /// Create a client with an existing HTTP client.
    pub fn new(http: reqwest::Client, base_url: &str, key: &str) -> Result<Self, StoreError> {
        Url::parse(base_url)
            .map_err(|e| StoreError::Unreachable(format!("invalid SUPABASE_URL: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// Get the project base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Accept", "application/json")
    }

    /// Run a select and return raw JSON rows.
    #[instrument(skip(self, query), fields(table = %query.table()))]
    pub async fn select(&self, query: &Select) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, query.table());
        let _timer = StoreTimer::new(query.table());

        let response = self
            .authorized(self.http.get(&url))
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(|e| record(transport_error(e)))?;

        let rows = self.read_rows(query.table(), response).await?;
        debug!(rows = rows.len(), "Select completed");
        Ok(rows)
    }

    /// Run a select and deserialize each row.
    pub async fn select_as<T: DeserializeOwned>(&self, query: &Select) -> Result<Vec<T>, StoreError> {
        self.select(query)
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    record(StoreError::ParseError(format!(
                        "row of {} did not match expected shape: {}",
                        query.table(),
                        e
                    )))
                })
            })
            .collect()
    }

    /// Call a Postgres function through `/rpc`.
    ///
    /// Set-returning functions yield their rows; scalar or object results are
    /// wrapped in a single-element vector, and `null` yields no rows.
    #[instrument(skip(self, args))]
    pub async fn rpc(&self, function: &str, args: &Value) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        let _timer = StoreTimer::new(function);

        let response = self
            .authorized(self.http.post(&url))
            .json(args)
            .send()
            .await
            .map_err(|e| record(transport_error(e)))?;

        self.read_rows(function, response).await
    }

    /// Fetch at most one row of `column` to prove the table and column exist
    /// and are readable.
    pub async fn sample_table(&self, table: &str, column: &str) -> Result<usize, StoreError> {
        let rows = self.select(&Select::from(table).columns(column).limit(1)).await?;
        Ok(rows.len())
    }

    /// Sign in with email and password through the auth API.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, StoreError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let _timer = StoreTimer::new("auth");

        let response = self
            .authorized(self.http.post(&url))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| record(transport_error(e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| record(StoreError::ParseError(format!("auth session: {}", e))));
        }

        let message = serde_json::from_str::<AuthApiError>(&body)
            .ok()
            .and_then(AuthApiError::into_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        let error = match status {
            // Invalid login comes back as 400 invalid_grant
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Rejected {
                status: status.as_u16(),
                message,
            },
            _ => classify_status("auth", status, &body),
        };

        Err(record(error))
    }

    async fn read_rows(&self, target: &str, response: Response) -> Result<Vec<Value>, StoreError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target = %target, status = %status, body = %preview(&body), "Store call failed");
            return Err(record(classify_status(target, status, &body)));
        }

        let value: Value = response.json().await.map_err(|e| {
            record(StoreError::ParseError(format!("{} response: {}", target, e)))
        })?;

        Ok(into_rows(value))
    }
}

/// Map a non-success store status to an error class.
pub(crate) fn classify_status(target: &str, status: StatusCode, body: &str) -> StoreError {
    let parsed = serde_json::from_str::<PostgrestError>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.code.as_deref());

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return StoreError::Unauthorized {
            target: target.to_string(),
            status: status.as_u16(),
        };
    }

    if status == StatusCode::NOT_FOUND
        || code.is_some_and(|c| MISSING_RELATION_CODES.contains(&c))
    {
        return StoreError::TableNotFound {
            table: target.to_string(),
        };
    }

    let missing_column = code == Some(MISSING_COLUMN_CODE);
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| preview(body));

    if missing_column {
        return StoreError::ColumnNotFound {
            table: target.to_string(),
            message,
        };
    }

    StoreError::UnexpectedResponse {
        target: target.to_string(),
        status: status.as_u16(),
        body: message,
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    if error.is_timeout() {
        StoreError::Unreachable(format!("timed out: {}", error))
    } else {
        StoreError::Unreachable(error.to_string())
    }
}

fn record(error: StoreError) -> StoreError {
    metrics::inc_store_errors(error.kind());
    error
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
