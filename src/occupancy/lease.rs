//! Lease overlap and per-unit occupancy over DoorLoop lease objects.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use time::Date;
use tracing::debug;

use super::dates::{inclusive_days, parse_lease_date};

/// Field names DoorLoop (and exports of it) use for the lease start.
const START_FIELDS: [&str; 5] = ["leaseStartDate", "startDate", "start_date", "lease_start_date", "start"];
/// Field names used for the lease end.
const END_FIELDS: [&str; 5] = ["leaseEndDate", "endDate", "end_date", "lease_end_date", "end"];
/// Single-or-list fields that carry unit ids.
const UNIT_FIELDS: [&str; 5] = ["unit_id", "unitId", "propertyUnitId", "unit", "unitIds"];

/// Inclusive date range of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day.
    pub start: Date,
    /// Last day.
    pub end: Date,
}

impl DateRange {
    /// Build a range; `None` when `end` precedes `start`.
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Days in the range, both ends included.
    pub fn days(&self) -> i64 {
        inclusive_days(self.start, self.end)
    }
}

fn first_str<'a>(lease: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| lease.get(*f))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
}

/// Raw start and end strings of a lease.
pub fn lease_dates(lease: &Value) -> (Option<&str>, Option<&str>) {
    (first_str(lease, &START_FIELDS), first_str(lease, &END_FIELDS))
}

/// Whether the lease is active at some point in `range`.
///
/// A lease overlaps when it starts in the range, ends in the range, spans
/// it, or has no end and started by the range end. Leases without a start
/// never overlap; leases whose dates cannot be parsed are kept.
pub fn lease_overlaps(lease: &Value, range: DateRange) -> bool {
    let (start, end) = lease_dates(lease);

    let Some(start) = start else {
        debug!("Lease missing start date");
        return false;
    };

    let Some(start) = parse_lease_date(start) else {
        debug!(start = %start, "Unparsable lease start, keeping lease");
        return true;
    };

    let end = match end {
        Some(raw) => match parse_lease_date(raw) {
            Some(date) => Some(date),
            None => {
                debug!(end = %raw, "Unparsable lease end, keeping lease");
                return true;
            }
        },
        None => None,
    };

    let in_range = |d: Date| range.start <= d && d <= range.end;

    match end {
        Some(end) => in_range(start) || in_range(end) || (start < range.start && end > range.end),
        None => start <= range.end,
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(id_string),
        _ => None,
    }
}

/// Unit ids referenced by a lease, deduplicated.
pub fn lease_unit_ids(lease: &Value) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();

    if let Some(Value::Array(units)) = lease.get("units") {
        ids.extend(units.iter().filter_map(id_string));
    }

    for field in UNIT_FIELDS {
        match lease.get(field) {
            Some(Value::Array(values)) => ids.extend(values.iter().filter_map(id_string)),
            Some(value) => ids.extend(id_string(value)),
            None => {}
        }
    }

    ids
}

/// Share of `range` covered by a lease, in percent (capped at 100).
///
/// `None` when the lease does not touch the range.
pub fn occupancy_percent(lease_start: Date, lease_end: Date, range: DateRange) -> Option<f64> {
    let overlap_start = lease_start.max(range.start);
    let overlap_end = lease_end.min(range.end);

    if overlap_start > overlap_end {
        return None;
    }

    let occupied = inclusive_days(overlap_start, overlap_end) as f64;
    Some((occupied / range.days() as f64 * 100.0).min(100.0))
}

/// Occupancy percentages per unit for a set of leases.
///
/// Each lease contributes one percentage to every unit it references (or to
/// its own id when it references none). Without a range every lease counts
/// as fully occupying. Leases with unparsable dates are skipped.
pub fn unit_occupancy(leases: &[Value], range: Option<DateRange>) -> BTreeMap<String, Vec<f64>> {
    let mut units: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for lease in leases {
        let mut keys = lease_unit_ids(lease);
        if keys.is_empty() {
            match lease.get("id").and_then(id_string) {
                Some(id) => {
                    keys.insert(id);
                }
                None => continue,
            }
        }

        let percent = match range {
            None => Some(100.0),
            Some(range) => {
                let (start, end) = lease_dates(lease);
                let (Some(start), Some(end)) = (
                    start.and_then(parse_lease_date),
                    end.and_then(parse_lease_date),
                ) else {
                    debug!(lease = ?lease.get("id"), "Skipping lease without usable dates");
                    continue;
                };
                occupancy_percent(start, end, range)
            }
        };

        if let Some(percent) = percent {
            for key in keys {
                units.entry(key).or_default().push(percent);
            }
        }
    }

    units
}

/// Property occupancy: per-unit mean percentage summed, over total units.
pub fn property_occupancy_rate(units: &BTreeMap<String, Vec<f64>>, total_units: usize) -> f64 {
    if total_units == 0 {
        return 0.0;
    }

    let sum: f64 = units
        .values()
        .filter(|p| !p.is_empty())
        .map(|p| p.iter().sum::<f64>() / p.len() as f64)
        .sum();

    sum / total_units as f64
}
