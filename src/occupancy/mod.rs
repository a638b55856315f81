//! Occupancy calculations over lease data.
//!
//! This module handles:
//! - Lease date parsing and month enumeration
//! - Lease/range overlap and per-unit occupancy (DoorLoop leases)
//! - Occupancy and financial rollups (long-term lease records)

pub mod dates;
pub mod lease;
pub mod rollup;

pub use dates::{format_iso_date, month_bounds, months_between, parse_iso_date, parse_lease_date};
pub use lease::{lease_overlaps, lease_unit_ids, property_occupancy_rate, unit_occupancy, DateRange};
pub use rollup::{calculate_financials, calculate_occupancy, parse_money, FinancialSummary, OccupancySummary};
