//! Integration tests for the gateway against local fake upstreams.
//!
//! Small axum servers impersonate the Supabase REST/auth API, DoorLoop and
//! the Guesty Open API, so these run without network access.

mod fake;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use propolis_gateway::api::{create_router, AppState};
use propolis_gateway::config::Config;

use fake::{DOORLOOP_TOKEN, GOOD_PASSWORD, GUESTY_CLIENT_ID, GUESTY_SECRET, STORE_KEY};

async fn store_config() -> Config {
    let url = fake::spawn(fake::store_router()).await;
    Config {
        supabase_url: Some(url),
        supabase_key: Some(STORE_KEY.to_string()),
        secret_key: Some("integration-secret".to_string()),
        http_timeout_ms: 5_000,
        ..Config::default()
    }
}

async fn doorloop_config() -> Config {
    let url = fake::spawn(fake::doorloop_router()).await;
    Config {
        doorloop_api_key: Some(DOORLOOP_TOKEN.to_string()),
        doorloop_base_url: url,
        http_timeout_ms: 5_000,
        ..Config::default()
    }
}

async fn guesty_config() -> Config {
    let url = fake::spawn(fake::guesty_router()).await;
    Config {
        guesty_client_id: Some(GUESTY_CLIENT_ID.to_string()),
        guesty_secret: Some(GUESTY_SECRET.to_string()),
        guesty_base_url: url,
        http_timeout_ms: 5_000,
        ..Config::default()
    }
}

fn table_outcomes(body: &Value) -> Vec<String> {
    body["checks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["kind"] == "table")
        .map(|c| c["outcome"].as_str().unwrap().to_string())
        .collect()
}

fn app(config: Config) -> Router {
    create_router(AppState::from_config(config))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn sources(body: &Value) -> Vec<(String, String)> {
    body["units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| {
            (
                u["source"].as_str().unwrap().to_string(),
                u["record"]["unit"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

// === /health and /db/health-check ===

#[tokio::test]
async fn health_is_ok_even_when_store_is_down() {
    let config = Config {
        supabase_url: Some("http://127.0.0.1:1".to_string()),
        supabase_key: Some(STORE_KEY.to_string()),
        ..Config::default()
    };
    let (status, body) = get(app(config), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn health_check_reports_credentials_and_tables() {
    let (status, body) = get(app(store_config().await), "/db/health-check").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        body["environment"],
        json!({
            "DOORLOOP_API_KEY": false,
            "GUESTY_CLIENT_ID": false,
            "GUESTY_SECRET": false,
            "SECRET_KEY": true,
            "SUPABASE_KEY": true,
            "SUPABASE_URL": true,
        })
    );

    let tables: Vec<(String, String)> = body["checks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["kind"] == "table")
        .map(|c| (c["name"].as_str().unwrap().to_string(), c["outcome"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        tables,
        vec![
            ("STR-Jul-2025".to_string(), "reachable".to_string()),
            ("Rent-Paid-July-2025".to_string(), "reachable".to_string()),
        ]
    );
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn health_check_distinguishes_missing_table_and_bad_key() {
    let mut config = store_config().await;
    config.rent_paid_table = "Rent-Paid-Aug-2025".to_string();
    let (status, body) = get(app(config), "/db/health-check").await;
    assert_eq!(status, StatusCode::OK);
    let outcome = |name: &str| {
        body["checks"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .map(|c| c["outcome"].clone())
    };
    assert_eq!(outcome("STR-Jul-2025"), Some(json!("reachable")));
    assert_eq!(outcome("Rent-Paid-Aug-2025"), Some(json!("table_not_found")));

    let mut config = store_config().await;
    config.supabase_key = Some("wrong-key".to_string());
    let (_, body) = get(app(config), "/db/health-check").await;
    assert!(body["checks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["kind"] == "table")
        .all(|c| c["outcome"] == "unauthorized"));
}

#[tokio::test]
async fn health_check_reports_unreachable_store() {
    let config = Config {
        supabase_url: Some("http://127.0.0.1:1".to_string()),
        supabase_key: Some(STORE_KEY.to_string()),
        http_timeout_ms: 2_000,
        ..Config::default()
    };
    let (status, body) = get(app(config), "/db/health-check").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(table_outcomes(&body), vec!["unreachable", "unreachable"]);
}

#[tokio::test]
async fn wrong_property_column_is_flagged_everywhere() {
    let mut config = store_config().await;
    config.units_property_column = "property_name".to_string();
    let router = app(config);

    let (status, body) = get(router.clone(), "/db/health-check").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table_outcomes(&body), vec!["column_not_found", "column_not_found"]);

    let (status, body) = get(router, "/db/units-for-property?property=Aerie%20Apartments").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "configuration");
}

// === /db/units-for-property ===

#[tokio::test]
async fn units_are_the_union_of_both_tables() {
    let (status, body) = get(app(store_config().await), "/db/units-for-property?property=Aerie%20Apartments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(
        sources(&body),
        vec![
            ("STR-Jul-2025".to_string(), "21A".to_string()),
            ("STR-Jul-2025".to_string(), "21B".to_string()),
            ("Rent-Paid-July-2025".to_string(), "30C".to_string()),
        ]
    );
    assert_eq!(body["debug"]["match_mode"], "exact");
    assert_eq!(body["debug"]["close_matches"], json!(["aerie apartments "]));
}

#[tokio::test]
async fn unknown_property_is_empty_with_known_names() {
    let (status, body) = get(app(store_config().await), "/db/units-for-property?property=Nowhere").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["units"], json!([]));
    assert_eq!(
        body["debug"]["known_property_names"],
        json!(["Aerie Apartments", "Birch Court", "aerie apartments "])
    );
    assert_eq!(body["debug"]["tables"][0]["matched"], 0);
}

#[tokio::test]
async fn repeated_lookups_are_identical() {
    let router = app(store_config().await);
    let (_, first) = get(router.clone(), "/db/units-for-property?property=Birch%20Court").await;
    let (_, second) = get(router, "/db/units-for-property?property=Birch%20Court").await;
    assert_eq!(first, second);
    assert_eq!(first["count"], 1);
}

#[tokio::test]
async fn missing_table_is_a_configuration_error_not_empty() {
    let mut config = store_config().await;
    config.str_table = "STR-Sep-2025".to_string();
    let (status, body) = get(app(config), "/db/units-for-property?property=Aerie%20Apartments").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "configuration");
}

#[tokio::test]
async fn unreachable_store_is_a_configuration_error() {
    let config = Config {
        supabase_url: Some("http://127.0.0.1:1".to_string()),
        supabase_key: Some(STORE_KEY.to_string()),
        http_timeout_ms: 2_000,
        ..Config::default()
    };
    let (status, body) = get(app(config), "/db/units-for-property?property=Aerie").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "configuration");
}

// === Reservations, listings, long-term filter ===

#[tokio::test]
async fn reservations_skip_unpaid_and_are_ordered() {
    let (status, body) = get(
        app(store_config().await),
        "/api/reservations/?property_full_name=Aerie%20Apartments",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"guesty_created_at": "2025-07-02T10:00:00", "total_paid": 300.0},
            {"guesty_created_at": "2025-07-03T10:00:00", "total_paid": 450.0},
        ])
    );
}

#[tokio::test]
async fn reservation_names_are_distinct() {
    let (status, body) = get(app(store_config().await), "/api/reservations/names").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Aerie Apartments", "Birch Court"]));
}

#[tokio::test]
async fn listings_are_typed() {
    let (status, body) = get(app(store_config().await), "/api/properties/listings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "L-1");
    assert_eq!(body[0]["amenities"], json!([]));
    assert!(body[0].get("some_new_column").is_none());
}

#[tokio::test]
async fn longterm_filter_skips_failing_months() {
    let (status, body) = get(
        app(store_config().await),
        "/api/longterm-unittype-filter/?date_from=2025-07-01&date_to=2025-08-31&property_id=Aerie&unit_type=3/3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["months_queried"], json!(["2025-07", "2025-08"]));
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["month"], "2025-07");
    assert_eq!(body["data"][0]["property"], "Aerie");

    assert_eq!(body["occupancy"]["total_units"], 2);
    assert_eq!(body["occupancy"]["occupied_units"], 2);
    assert_eq!(body["occupancy"]["total_days_in_range"], 62);
    assert_eq!(body["occupancy"]["total_occupied_days"], 62 + 47);

    assert_eq!(body["financials"]["total_revenue"], 2975.0);
    assert_eq!(body["financials"]["total_balance_due"], -25.0);
}

#[tokio::test]
async fn longterm_filter_with_bad_key_is_configuration_error() {
    let mut config = store_config().await;
    config.supabase_key = Some("wrong-key".to_string());
    let (status, body) = get(
        app(config),
        "/api/longterm-unittype-filter/?date_from=2025-07-01&date_to=2025-08-31&property_id=Aerie&unit_type=3/3",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "configuration");
}

#[tokio::test]
async fn longterm_filter_length_is_case_insensitive() {
    let (status, body) = get(
        app(store_config().await),
        "/api/longterm-unittype-filter/?date_from=2025-07-01&date_to=2025-07-31&property_id=Aerie&unit_type=3/3&length=long",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn longterm_filter_rejects_unknown_length() {
    let (status, body) = get(
        app(store_config().await),
        "/api/longterm-unittype-filter/?date_from=2025-07-01&date_to=2025-07-31&property_id=Aerie&unit_type=3/3&length=Medium",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
}

// === Auth ===

fn login_request(password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "ops@propolis.test", "password": password}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn login_issues_token_accepted_by_me() {
    let router = app(store_config().await);

    let (status, body) = send(router.clone(), login_request(GOOD_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_ne!(token, "store-session-token");

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"email": "ops@propolis.test"}));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let (status, body) = send(app(store_config().await), login_request("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(store_config().await), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// === DoorLoop ===

#[tokio::test]
async fn doorloop_units_are_deduplicated() {
    let (status, body) = get(app(doorloop_config().await), "/api/doorloop/units?property_id=%22p1%22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["property_id"], "p1");
    assert_eq!(body["num_of_units"], 4);
    assert_eq!(body["total_units_returned"], 5);
    assert_eq!(body["units"], json!(["u1", "u2", "u3", "u4"]));
}

#[tokio::test]
async fn doorloop_missing_unit_is_404() {
    let (status, body) = get(app(doorloop_config().await), "/api/doorloop/units/u404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unit u404 not found");

    let (status, body) = get(app(doorloop_config().await), "/api/doorloop/units/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "21A");
}

#[tokio::test]
async fn doorloop_property_passthrough() {
    let (status, body) = get(app(doorloop_config().await), "/api/doorloop/properties/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Aerie");

    let (status, _) = get(app(doorloop_config().await), "/api/doorloop/properties/p9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn doorloop_login_page_is_bad_gateway() {
    let mut config = doorloop_config().await;
    config.doorloop_api_key = Some("expired".to_string());
    let (status, body) = get(app(config), "/api/doorloop/properties").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "upstream");
}

#[tokio::test]
async fn doorloop_lease_percentages_per_unit() {
    let (status, body) = get(
        app(doorloop_config().await),
        "/api/doorloop/leases?property_id=p1&start_date=2025-07-01&end_date=2025-07-31",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["leases_considered"], 3);
    assert_eq!(body["units"]["u1"], json!([100.0]));
    assert!(body["units"].get("u3").is_none());
    let u2 = body["units"]["u2"][0].as_f64().unwrap();
    assert!((u2 - 16.0 / 31.0 * 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn doorloop_leases_need_both_dates() {
    let (status, body) = get(
        app(doorloop_config().await),
        "/api/doorloop/leases?property_id=p1&start_date=2025-07-01",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    assert_eq!(body["error"], "start_date and end_date must be given together");
}

#[tokio::test]
async fn doorloop_property_occupancy_rate() {
    let (status, body) = get(
        app(doorloop_config().await),
        "/api/doorloop/occupancy-rate-doorloop?date_from=2025-07-01&date_to=2025-07-31&property_id=p1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_units"], 4);
    assert_eq!(body["occupied_units"], 2);
    assert_eq!(body["occupancy_rate"], 37.9);
    assert_eq!(body["percentage"], "37.9%");
}

#[tokio::test]
async fn doorloop_overall_occupancy_rate() {
    let (status, body) = get(
        app(doorloop_config().await),
        "/api/doorloop/occupancy-rate-doorloop?date_from=2025-07-01&date_to=2025-07-31",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_units"], 8);
    assert_eq!(body["occupied_units"], 4);
    assert_eq!(body["occupancy_rate"], 50.0);
    assert_eq!(body["percentage"], "50.0%");
    assert_eq!(body["date_from"], "2025-07-01");
    assert!(body.get("property_id").is_none());
}

// === Guesty ===

#[tokio::test]
async fn guesty_listings_are_limited_to_one() {
    let (status, body) = get(app(guesty_config().await), "/api/guesty/listings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], "1");
    assert_eq!(body["results"][0]["_id"], "g-l1");
}

#[tokio::test]
async fn guesty_reservations_and_users_pass_through() {
    let router = app(guesty_config().await);

    let (status, body) = get(router.clone(), "/api/guesty/reservations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["limit"], Value::Null);

    let (status, body) = get(router, "/api/guesty/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["email"], "ops@propolis.test");
}

#[tokio::test]
async fn guesty_rejected_credentials_are_bad_gateway() {
    let mut config = guesty_config().await;
    config.guesty_secret = Some("rotated".to_string());
    let (status, body) = get(app(config), "/api/guesty/users").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "upstream");
    assert_eq!(body["error"], "Failed to fetch Guesty token");
}
