//! In-process stand-ins for the Supabase REST/auth API, DoorLoop and Guesty.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const STORE_KEY: &str = "test-service-key";
pub const DOORLOOP_TOKEN: &str = "doorloop-test-token";
pub const GOOD_PASSWORD: &str = "correct horse";
pub const GUESTY_CLIENT_ID: &str = "guesty-client";
pub const GUESTY_SECRET: &str = "guesty-secret";
const GUESTY_TOKEN: &str = "guesty-access-token";

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// === Store ===

type Tables = Arc<BTreeMap<String, Vec<Value>>>;

pub fn store_tables() -> BTreeMap<String, Vec<Value>> {
    let mut tables = BTreeMap::new();
    tables.insert(
        "STR-Jul-2025".to_string(),
        vec![
            json!({"id": 1, "property": "Aerie Apartments", "unit": "21A", "nightly_rate": 189}),
            json!({"id": 2, "property": "Birch Court", "unit": "4"}),
            json!({"id": 3, "property": "Aerie Apartments", "unit": "21B", "nightly_rate": 175}),
        ],
    );
    tables.insert(
        "Rent-Paid-July-2025".to_string(),
        vec![
            json!({"id": 10, "property": "Aerie Apartments", "unit": "30C", "rent": "$1,475.00"}),
            json!({"id": 11, "property": "aerie apartments ", "unit": "31"}),
            json!({"id": 12, "property": null, "unit": "99"}),
        ],
    );
    tables.insert(
        "reservations".to_string(),
        vec![
            json!({"property_full_name": "Aerie Apartments", "total_paid": 450, "guesty_created_at": "2025-07-03T10:00:00"}),
            json!({"property_full_name": "Aerie Apartments", "total_paid": 0, "guesty_created_at": "2025-07-01T10:00:00"}),
            json!({"property_full_name": "Aerie Apartments", "total_paid": 300, "guesty_created_at": "2025-07-02T10:00:00"}),
            json!({"property_full_name": "Birch Court", "total_paid": 120, "guesty_created_at": "2025-07-05T10:00:00"}),
            json!({"property_full_name": null, "total_paid": 80, "guesty_created_at": "2025-07-06T10:00:00"}),
        ],
    );
    tables.insert(
        "jd_listing".to_string(),
        vec![json!({
            "id": "L-1",
            "account_id": "acct",
            "created_at": "2025-01-01T00:00:00+00:00",
            "title": "Aerie 21A",
            "bathrooms": 2.5,
            "tags": ["long-term"],
            "amenities": null,
            "some_new_column": true
        })],
    );
    tables
}

fn cell(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn postgrest_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"code": code, "message": message}))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(STORE_KEY) && bearer == Some(format!("Bearer {}", STORE_KEY).as_str())
}

async fn select(
    State(tables): State<Tables>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return postgrest_error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }

    let Some(rows) = tables.get(&table) else {
        return postgrest_error(
            StatusCode::NOT_FOUND,
            "PGRST205",
            &format!("Could not find the table 'public.{}' in the schema cache", table),
        );
    };

    let known_column = |column: &str| rows.iter().any(|row| row.get(column).is_some());
    let undefined_column = |column: &str| {
        postgrest_error(
            StatusCode::BAD_REQUEST,
            "42703",
            &format!("column {}.{} does not exist", table, column),
        )
    };

    for (key, value) in &params {
        let referenced: Vec<&str> = match key.as_str() {
            "select" if value != "*" => value.split(',').map(str::trim).collect(),
            "select" | "limit" | "order" => Vec::new(),
            column => vec![column],
        };
        if let Some(missing) = referenced.into_iter().find(|c| !known_column(c)) {
            return undefined_column(missing);
        }
    }

    let mut rows: Vec<Value> = rows.clone();
    let mut columns = "*".to_string();
    let mut limit = None;
    let mut order = None;

    for (key, value) in params {
        match key.as_str() {
            "select" => columns = value,
            "limit" => limit = value.parse::<usize>().ok(),
            "order" => order = Some(value),
            column => {
                if let Some(wanted) = value.strip_prefix("eq.") {
                    rows.retain(|row| cell(row.get(column)).as_deref() == Some(wanted));
                } else if let Some(unwanted) = value.strip_prefix("neq.") {
                    rows.retain(|row| cell(row.get(column)).is_some_and(|v| v != unwanted));
                }
            }
        }
    }

    if let Some(order) = order {
        let column = order.split('.').next().unwrap_or_default().to_string();
        rows.sort_by_key(|row| cell(row.get(&column)));
        if order.ends_with(".desc") {
            rows.reverse();
        }
    }

    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    if columns != "*" {
        let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
        rows = rows
            .into_iter()
            .map(|row| {
                let projected: serde_json::Map<String, Value> = wanted
                    .iter()
                    .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                    .collect();
                Value::Object(projected)
            })
            .collect();
    }

    Json(rows).into_response()
}

async fn rpc(Path(function): Path<String>, headers: HeaderMap, Json(args): Json<Value>) -> Response {
    if !authorized(&headers) {
        return postgrest_error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT invalid");
    }
    if function != "get_filtered_leases" {
        return postgrest_error(StatusCode::NOT_FOUND, "PGRST202", "Could not find the function");
    }

    match args["p_date"].as_str() {
        Some("2025-07") => Json(json!([
            {"unit": "21A", "unit_type": "3/3", "lease_start_date": "6/1/25", "lease_end_date": "5/31/26",
             "revenue": "$1,475.00", "balance_due": "$0.00", "property": args["p_property"]},
            {"unit": "21B", "unit_type": "3/3", "lease_start_date": "7/16/2025", "lease_end_date": "",
             "revenue": "$1,500.00", "balance_due": "($25.00)", "property": args["p_property"]},
        ]))
        .into_response(),
        // August has no monthly table yet
        Some("2025-08") => postgrest_error(
            StatusCode::NOT_FOUND,
            "42P01",
            "relation \"public.leases_2025_08\" does not exist",
        ),
        _ => Json(json!([])).into_response(),
    }
}

async fn token(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(STORE_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid API key"}))).into_response();
    }
    if params.get("grant_type").map(String::as_str) != Some("password") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"}))).into_response();
    }

    if body["password"] == GOOD_PASSWORD {
        Json(json!({
            "access_token": "store-session-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {"email": body["email"]}
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
            .into_response()
    }
}

/// Router answering like Supabase for the fixture tables.
pub fn store_router() -> Router {
    Router::new()
        .route("/rest/v1/:table", get(select))
        .route("/rest/v1/rpc/:function", post(rpc))
        .route("/auth/v1/token", post(token))
        .with_state(Arc::new(store_tables()))
}

// === DoorLoop ===

fn doorloop_authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(format!("Bearer {}", DOORLOOP_TOKEN).as_str())
}

fn unauthorized_page() -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/html; charset=utf-8")],
        "<html><body>Sign in</body></html>",
    )
        .into_response()
}

async fn dl_properties(headers: HeaderMap) -> Response {
    if !doorloop_authorized(&headers) {
        return unauthorized_page();
    }
    Json(json!({"data": [{"id": "p1", "name": "Aerie"}, {"id": "p2", "name": "Birch"}], "total": 2})).into_response()
}

async fn dl_property(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !doorloop_authorized(&headers) {
        return unauthorized_page();
    }
    match id.as_str() {
        "p1" => Json(json!({"id": "p1", "name": "Aerie"})).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
    }
}

async fn dl_units(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !doorloop_authorized(&headers) {
        return unauthorized_page();
    }
    let data = match params.get("filter_property").map(String::as_str) {
        Some("p1") => json!([{"id": "u1"}, {"id": "u2"}, {"id": "u2"}, {"id": "u3"}, {"id": "u4"}]),
        Some(_) => json!([]),
        None => json!([
            {"id": "u1"}, {"id": "u2"}, {"id": "u3"}, {"id": "u4"},
            {"id": "u5"}, {"id": "u6"}, {"id": "u7"}, {"id": "u8"}
        ]),
    };
    Json(json!({"data": data})).into_response()
}

async fn dl_unit(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !doorloop_authorized(&headers) {
        return unauthorized_page();
    }
    match id.as_str() {
        "u1" => Json(json!({"id": "u1", "name": "21A", "property": "p1"})).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
    }
}

async fn dl_leases(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    if !doorloop_authorized(&headers) {
        return unauthorized_page();
    }
    let data = match params.get("filter_property").map(String::as_str) {
        Some("p1") => json!([
            // whole of July
            {"id": "l1", "units": ["u1"], "start": "2025-06-01", "end": "2026-05-31"},
            // second half of July (16 of 31 days)
            {"id": "l2", "units": ["u2"], "start": "2025-07-16", "end": "2026-07-15"},
            // ended before July
            {"id": "l3", "units": ["u3"], "start": "2024-06-01", "end": "2025-05-31"},
        ]),
        Some(_) => json!([]),
        None => json!([
            {"id": "l1", "units": ["u1"], "startDate": "2025-06-01", "endDate": "2026-05-31"},
            {"id": "l2", "units": ["u2", "u3"], "startDate": "2025-07-16"},
            {"id": "l4", "unitId": "u5", "leaseStartDate": "2025-07-10T00:00:00.000Z", "leaseEndDate": "2025-07-20T00:00:00.000Z"},
            {"id": "l5", "units": ["u6"], "startDate": "2025-09-01", "endDate": "2026-08-31"},
            {"id": "l6", "units": ["u7"]},
        ]),
    };
    Json(json!({"data": data})).into_response()
}

/// Router answering like DoorLoop's REST API.
pub fn doorloop_router() -> Router {
    Router::new()
        .route("/properties", get(dl_properties))
        .route("/properties/:id", get(dl_property))
        .route("/units", get(dl_units))
        .route("/units/:id", get(dl_unit))
        .route("/leases", get(dl_leases))
}

// === Guesty ===

async fn gy_token(Form(form): Form<HashMap<String, String>>) -> Response {
    let field = |name: &str| form.get(name).map(String::as_str);
    let valid = field("grant_type") == Some("client_credentials")
        && field("scope") == Some("open-api")
        && field("client_id") == Some(GUESTY_CLIENT_ID)
        && field("client_secret") == Some(GUESTY_SECRET);

    if valid {
        Json(json!({"access_token": GUESTY_TOKEN, "token_type": "Bearer", "expires_in": 86400})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"}))).into_response()
    }
}

async fn gy_collection(
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    if bearer != Some(format!("Bearer {}", GUESTY_TOKEN).as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response();
    }

    let results = match collection.as_str() {
        "listings" => json!([{"_id": "g-l1", "title": "Aerie 21A"}]),
        "reservations" => json!([{"_id": "g-r1", "confirmationCode": "GY-1"}, {"_id": "g-r2", "confirmationCode": "GY-2"}]),
        "users" => json!([{"_id": "g-u1", "email": "ops@propolis.test"}]),
        _ => return (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))).into_response(),
    };

    Json(json!({"results": results, "limit": params.get("limit")})).into_response()
}

/// Router answering like the Guesty Open API.
pub fn guesty_router() -> Router {
    Router::new()
        .route("/oauth2/token", post(gy_token))
        .route("/v1/:collection", get(gy_collection))
}
