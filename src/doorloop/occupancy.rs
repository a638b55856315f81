//! Occupancy rates computed from DoorLoop units and leases.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::DoorloopError;
use crate::occupancy::{
    format_iso_date, lease_overlaps, lease_unit_ids, property_occupancy_rate, unit_occupancy, DateRange,
};
use crate::utils::round2;

use super::client::DoorloopClient;
use super::types::{unique_ids, OccupancyRate};

/// Rate with a percent sign; whole numbers keep one decimal (`50.0%`).
fn percent_label(rate: f64) -> String {
    if rate.fract() == 0.0 {
        format!("{:.1}%", rate)
    } else {
        format!("{}%", rate)
    }
}

fn rate_response(
    rate: f64,
    occupied_units: usize,
    total_units: usize,
    property_id: Option<&str>,
    range: DateRange,
) -> OccupancyRate {
    let rate = round2(rate);
    OccupancyRate {
        occupancy_rate: rate,
        occupied_units,
        total_units,
        property_id: property_id.map(str::to_string),
        date_from: format_iso_date(range.start),
        date_to: format_iso_date(range.end),
        percentage: percent_label(rate),
    }
}

/// Occupancy of one property over `range`.
///
/// Each occupied unit contributes the mean of its lease percentages; the sum
/// is divided by the property's distinct unit count.
#[instrument(skip(client))]
pub async fn property_occupancy(
    client: &DoorloopClient,
    property_id: &str,
    range: DateRange,
) -> Result<OccupancyRate, DoorloopError> {
    let (units, leases) = tokio::try_join!(
        client.units_for_property(property_id),
        client.leases_for_property(property_id),
    )?;

    let total_units = unique_ids(&units).len();
    let per_unit = unit_occupancy(&leases, Some(range));
    let rate = property_occupancy_rate(&per_unit, total_units);

    info!(
        property_id = %property_id,
        total_units,
        occupied_units = per_unit.len(),
        rate,
        "Computed property occupancy"
    );

    Ok(rate_response(rate, per_unit.len(), total_units, Some(property_id), range))
}

/// Units referenced by leases that overlap `range`.
pub fn occupied_unit_ids(leases: &[Value], range: DateRange) -> BTreeSet<String> {
    leases
        .iter()
        .filter(|lease| lease_overlaps(lease, range))
        .flat_map(lease_unit_ids)
        .collect()
}

/// Occupancy across every property: occupied units over all units.
#[instrument(skip(client))]
pub async fn overall_occupancy(client: &DoorloopClient, range: DateRange) -> Result<OccupancyRate, DoorloopError> {
    let lease_filter = [
        ("filter_date_from", format_iso_date(range.start)),
        ("filter_date_to", format_iso_date(range.end)),
        ("filter_status", "active".to_string()),
    ];

    let (units, leases) = tokio::try_join!(
        client.fetch_all("units", &[]),
        client.fetch_all("leases", &lease_filter),
    )?;

    let total_units = match unique_ids(&units).len() {
        0 => units.len(),
        n => n,
    };
    let occupied = occupied_unit_ids(&leases, range);

    if occupied.is_empty() && !leases.is_empty() {
        warn!(leases = leases.len(), "Leases found but none referenced an occupied unit");
    }

    let rate = if total_units == 0 {
        0.0
    } else {
        occupied.len() as f64 / total_units as f64 * 100.0
    };

    info!(total_units, occupied_units = occupied.len(), rate, "Computed overall occupancy");

    Ok(rate_response(rate, occupied.len(), total_units, None, range))
}
