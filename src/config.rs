//! Application configuration loaded from environment variables.

use serde::Deserialize;
use url::Url;

/// Environment variables the gateway needs for full operation.
///
/// The process starts without them so the health check can report which are
/// missing.
pub const REQUIRED_ENV_VARS: [&str; 6] = [
    "GUESTY_SECRET",
    "GUESTY_CLIENT_ID",
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SECRET_KEY",
    "DOORLOOP_API_KEY",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Credentials ===
    /// Guesty OAuth client secret.
    #[serde(default)]
    pub guesty_secret: Option<String>,

    /// Guesty OAuth client id.
    #[serde(default)]
    pub guesty_client_id: Option<String>,

    /// Supabase project URL (e.g. `https://xyz.supabase.co`).
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase service or anon key.
    #[serde(default)]
    pub supabase_key: Option<String>,

    /// HMAC secret for session JWTs.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// DoorLoop API token.
    #[serde(default)]
    pub doorloop_api_key: Option<String>,

    // === Store Layout ===
    /// Short-term rental units table.
    #[serde(default = "default_str_table")]
    pub str_table: String,

    /// Rent-paid units table.
    #[serde(default = "default_rent_paid_table")]
    pub rent_paid_table: String,

    /// Column holding the property name in both unit tables.
    #[serde(default = "default_property_column")]
    pub units_property_column: String,

    /// Reservations table.
    #[serde(default = "default_reservations_table")]
    pub reservations_table: String,

    /// Guesty listings mirror table.
    #[serde(default = "default_listings_table")]
    pub listings_table: String,

    /// RPC returning filtered long-term leases for one month.
    #[serde(default = "default_leases_rpc")]
    pub leases_rpc: String,

    // === DoorLoop ===
    /// DoorLoop REST base URL.
    #[serde(default = "default_doorloop_base_url")]
    pub doorloop_base_url: String,

    // === Guesty ===
    /// Guesty Open API base URL; the token endpoint lives under it.
    #[serde(default = "default_guesty_base_url")]
    pub guesty_base_url: String,

    // === Sessions ===
    /// JWT signing algorithm name.
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// Session token lifetime.
    #[serde(default = "default_jwt_expiration_minutes")]
    pub jwt_expiration_minutes: i64,

    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Comma-separated origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Timeout for outbound HTTP calls.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_str_table() -> String {
    "STR-Jul-2025".to_string()
}

fn default_rent_paid_table() -> String {
    "Rent-Paid-July-2025".to_string()
}

fn default_property_column() -> String {
    "property".to_string()
}

fn default_reservations_table() -> String {
    "reservations".to_string()
}

fn default_listings_table() -> String {
    "jd_listing".to_string()
}

fn default_leases_rpc() -> String {
    "get_filtered_leases".to_string()
}

fn default_doorloop_base_url() -> String {
    "https://app.doorloop.com/api".to_string()
}

fn default_guesty_base_url() -> String {
    "https://open-api.guesty.com".to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_jwt_expiration_minutes() -> i64 {
    60
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> String {
    "http://localhost:5173,http://localhost:5174".to_string()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            guesty_secret: None,
            guesty_client_id: None,
            supabase_url: None,
            supabase_key: None,
            secret_key: None,
            doorloop_api_key: None,
            str_table: default_str_table(),
            rent_paid_table: default_rent_paid_table(),
            units_property_column: default_property_column(),
            reservations_table: default_reservations_table(),
            listings_table: default_listings_table(),
            leases_rpc: default_leases_rpc(),
            doorloop_base_url: default_doorloop_base_url(),
            guesty_base_url: default_guesty_base_url(),
            jwt_algorithm: default_jwt_algorithm(),
            jwt_expiration_minutes: default_jwt_expiration_minutes(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    ///
    /// Missing credentials are not an error here; only malformed values are.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = self.supabase_url() {
            Url::parse(url).map_err(|e| format!("SUPABASE_URL is not a valid URL: {}", e))?;
        }

        Url::parse(&self.doorloop_base_url)
            .map_err(|e| format!("DOORLOOP_BASE_URL is not a valid URL: {}", e))?;

        Url::parse(&self.guesty_base_url)
            .map_err(|e| format!("GUESTY_BASE_URL is not a valid URL: {}", e))?;

        if self.units_property_column.trim().is_empty() {
            return Err("UNITS_PROPERTY_COLUMN must not be empty".to_string());
        }

        if self.jwt_expiration_minutes <= 0 {
            return Err("JWT_EXPIRATION_MINUTES must be positive".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be positive".to_string());
        }

        Ok(())
    }

    /// Presence of each required environment variable, in declaration order.
    pub fn credential_presence(&self) -> Vec<(&'static str, bool)> {
        let values = [
            &self.guesty_secret,
            &self.guesty_client_id,
            &self.supabase_url,
            &self.supabase_key,
            &self.secret_key,
            &self.doorloop_api_key,
        ];

        REQUIRED_ENV_VARS
            .iter()
            .zip(values)
            .map(|(name, value)| (*name, non_blank(value).is_some()))
            .collect()
    }

    /// Supabase URL if set and non-blank.
    pub fn supabase_url(&self) -> Option<&str> {
        non_blank(&self.supabase_url)
    }

    /// Supabase key if set and non-blank.
    pub fn supabase_key(&self) -> Option<&str> {
        non_blank(&self.supabase_key)
    }

    /// JWT secret if set and non-blank.
    pub fn secret_key(&self) -> Option<&str> {
        non_blank(&self.secret_key)
    }

    /// Guesty OAuth client id and secret, when both are set.
    pub fn guesty_credentials(&self) -> Option<(&str, &str)> {
        Some((non_blank(&self.guesty_client_id)?, non_blank(&self.guesty_secret)?))
    }

    /// DoorLoop token if set and non-blank.
    pub fn doorloop_api_key(&self) -> Option<&str> {
        non_blank(&self.doorloop_api_key)
    }

    /// The two unit tables queried by the property lookup.
    pub fn unit_tables(&self) -> [&str; 2] {
        [&self.str_table, &self.rent_paid_table]
    }

    /// Parsed CORS origins, blanks dropped.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
