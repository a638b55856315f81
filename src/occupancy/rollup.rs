//! Occupancy and financial rollups over long-term lease records.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::utils::round2;

use super::dates::{inclusive_days, parse_lease_date};
use super::lease::DateRange;

/// Occupancy metrics for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct OccupancySummary {
    /// Distinct units seen.
    pub total_units: usize,
    /// Units with at least one occupied day.
    pub occupied_units: usize,
    /// Occupied units over total units, percent.
    pub occupancy_rate: f64,
    /// Occupied unit-days over possible unit-days, percent.
    pub days_occupancy_rate: f64,
    /// Sum of occupied days across units.
    pub total_occupied_days: i64,
    /// Mean occupied days per unit (one decimal).
    pub average_occupied_days: f64,
    /// Days in the requested range.
    pub total_days_in_range: i64,
}

/// Money totals across records.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct FinancialSummary {
    /// Sum of `revenue`.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    /// Sum of `balance_due`.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_balance_due: Decimal,
}

fn str_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Occupancy of units across `records` within `range`.
///
/// Each unit counts its longest single-lease overlap with the range. A lease
/// with no end date runs to the end of the range.
pub fn calculate_occupancy(records: &[Value], range: DateRange) -> OccupancySummary {
    let total_days_in_range = range.days();

    if records.is_empty() {
        return OccupancySummary {
            total_days_in_range,
            ..OccupancySummary::default()
        };
    }

    let mut unit_days: BTreeMap<String, i64> = BTreeMap::new();

    for record in records {
        let Some(unit) = str_field(record, "unit") else {
            continue;
        };
        let days = unit_days.entry(unit.to_string()).or_insert(0);

        let Some(start) = str_field(record, "lease_start_date").and_then(parse_lease_date) else {
            continue;
        };
        let end = match str_field(record, "lease_end_date") {
            Some(raw) => match parse_lease_date(raw) {
                Some(end) => end,
                None => continue,
            },
            None => range.end,
        };

        let overlap_start = start.max(range.start);
        let overlap_end = end.min(range.end);
        if overlap_start <= overlap_end {
            *days = (*days).max(inclusive_days(overlap_start, overlap_end));
        }
    }

    let total_units = unit_days.len();
    let occupied_units = unit_days.values().filter(|d| **d > 0).count();
    let total_occupied_days: i64 = unit_days.values().sum();

    let (occupancy_rate, average_occupied_days, days_occupancy_rate) = if total_units > 0 {
        let possible = total_units as i64 * total_days_in_range;
        (
            occupied_units as f64 / total_units as f64 * 100.0,
            total_occupied_days as f64 / total_units as f64,
            if possible > 0 {
                total_occupied_days as f64 / possible as f64 * 100.0
            } else {
                0.0
            },
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    OccupancySummary {
        total_units,
        occupied_units,
        occupancy_rate: round2(occupancy_rate),
        days_occupancy_rate: round2(days_occupancy_rate),
        total_occupied_days,
        average_occupied_days: (average_occupied_days * 10.0).round() / 10.0,
        total_days_in_range,
    }
}

/// Parse an accounting amount: `$1,475.00`, `1475`, `($1,475.00)`, `-$3.50`.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    let (negative, digits) = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, cleaned),
    };

    let amount = Decimal::from_str(digits).ok()?;
    Some(if negative { -amount } else { amount })
}

/// Revenue and balance-due totals. Unparsable amounts are ignored.
pub fn calculate_financials(records: &[Value]) -> FinancialSummary {
    let sum = |field: &str| -> Decimal {
        records
            .iter()
            .filter_map(|r| str_field(r, field))
            .filter_map(parse_money)
            .sum::<Decimal>()
            .round_dp(2)
    };

    FinancialSummary {
        total_revenue: sum("revenue"),
        total_balance_due: sum("balance_due"),
    }
}
