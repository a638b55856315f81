//! Long-term lease filter by property, unit type and lease length.
//!
//! Lease data lives in one table per month behind a single RPC. The filter
//! calls it once per month of the range and rolls the combined records up
//! into occupancy and financial summaries.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::occupancy::{
    calculate_financials, calculate_occupancy, months_between, DateRange, FinancialSummary, OccupancySummary,
};
use crate::error::StoreError;
use crate::store::SupabaseClient;

/// Lease length class understood by the RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(ascii_case_insensitive)]
pub enum LeaseLength {
    #[default]
    Long,
    Short,
}

/// Filter parameters besides the date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseFilter {
    /// Property name without the "Apartments" suffix.
    pub property: String,
    /// Unit type such as `3/3`.
    pub unit_type: String,
    pub length: LeaseLength,
    /// Restrict to one unit.
    pub unit: Option<String>,
}

impl LeaseFilter {
    fn rpc_args(&self, month: &str) -> Value {
        json!({
            "p_date": month,
            "p_property": self.property,
            "p_unit_type": self.unit_type,
            "p_length": self.length.to_string(),
            "p_unit": self.unit,
        })
    }
}

/// Records and rollups of one filter run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaseReport {
    /// Always true; store failures on individual months are skipped.
    pub success: bool,
    /// Lease records, each tagged with `month`.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    pub count: usize,
    /// Months requested from the store (`YYYY-MM`).
    pub months_queried: Vec<String>,
    #[schema(value_type = Object)]
    pub occupancy: OccupancySummary,
    #[schema(value_type = Object)]
    pub financials: FinancialSummary,
}

fn tag_month(rows: Vec<Value>, month: &str) -> Vec<Value> {
    rows.into_iter()
        .map(|mut row| {
            if let Value::Object(map) = &mut row {
                map.insert("month".to_string(), Value::String(month.to_string()));
            }
            row
        })
        .collect()
}

/// Combine per-month records and compute the rollups.
pub fn build_report(months: Vec<String>, per_month: Vec<Vec<Value>>, range: DateRange) -> LeaseReport {
    let data: Vec<Value> = per_month.into_iter().flatten().collect();
    let occupancy = calculate_occupancy(&data, range);
    let financials = calculate_financials(&data);

    LeaseReport {
        success: true,
        count: data.len(),
        data,
        months_queried: months,
        occupancy,
        financials,
    }
}

/// Query every month of `range` concurrently and roll the results up.
///
/// A month whose call fails (usually a missing monthly table) is logged and
/// contributes no records.
/// Whether a failed month should be skipped rather than failing the report.
///
/// A missing monthly table only means there is no data for that month; every
/// other configuration problem affects all months alike.
fn skippable(error: &StoreError) -> bool {
    matches!(error, StoreError::TableNotFound { .. }) || !error.is_configuration()
}

#[instrument(skip(store, filter), fields(property = %filter.property, unit_type = %filter.unit_type))]
pub async fn filter_leases(
    store: &SupabaseClient,
    function: &str,
    filter: &LeaseFilter,
    range: DateRange,
) -> Result<LeaseReport, StoreError> {
    let months = months_between(range.start, range.end);

    let calls = months.iter().map(|month| async move {
        match store.rpc(function, &filter.rpc_args(month)).await {
            Ok(rows) => {
                info!(month = %month, rows = rows.len(), "Month queried");
                Ok(tag_month(rows, month))
            }
            Err(e) if skippable(&e) => {
                warn!(month = %month, error = %e, "Skipping month");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    });
    let per_month = futures::future::try_join_all(calls).await?;

    Ok(build_report(months, per_month, range))
}
