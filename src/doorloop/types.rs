//! DoorLoop response envelopes and gateway summaries.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Rows of a DoorLoop `{ "data": [...] }` envelope (bare arrays accepted).
pub fn data_array(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Distinct `id` values of DoorLoop objects.
pub fn unique_ids(rows: &[Value]) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|row| row.get("id"))
        .filter_map(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

/// Strip quotes that dashboard links sometimes leave around ids.
pub fn clean_id(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// `/api/doorloop/health` body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceHealth {
    /// Always "healthy".
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Service label.
    #[schema(value_type = String)]
    pub service: &'static str,
}

/// Unique units of one property.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitsSummary {
    /// Always true; failures are errors.
    pub success: bool,
    /// Number of distinct unit ids.
    pub num_of_units: usize,
    /// Property queried.
    pub property_id: String,
    /// Distinct unit ids.
    pub units: Vec<String>,
    /// Raw rows returned before de-duplication.
    pub total_units_returned: usize,
}

/// One DoorLoop unit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitDetail {
    /// Always true; failures are errors.
    pub success: bool,
    /// Unit id after cleaning.
    pub unit_id: String,
    /// Unit as returned by DoorLoop.
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Requested date window echoed back.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DateWindow {
    /// First day (`YYYY-MM-DD`).
    pub date_from: String,
    /// Last day (`YYYY-MM-DD`).
    pub date_to: String,
}

/// Per-unit occupancy percentages of one property.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaseOccupancy {
    /// Always true; failures are errors.
    pub success: bool,
    /// Property queried.
    pub property_id: String,
    /// Window applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateWindow>,
    /// Leases returned by DoorLoop.
    pub leases_considered: usize,
    /// Unit id (or lease id) to occupancy percentages.
    pub units: BTreeMap<String, Vec<f64>>,
}

/// `/api/doorloop/occupancy-rate-doorloop` body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OccupancyRate {
    /// Occupancy in percent, two decimals.
    pub occupancy_rate: f64,
    /// Units counted as occupied.
    pub occupied_units: usize,
    /// Units in scope.
    pub total_units: usize,
    /// Property, when the rate is property-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// First day.
    pub date_from: String,
    /// Last day.
    pub date_to: String,
    /// `occupancy_rate` rendered with a percent sign.
    pub percentage: String,
}
