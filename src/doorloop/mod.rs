//! DoorLoop property-management API.
//!
//! This module handles:
//! - Authenticated, paginated reads of properties, units and leases
//! - Per-property and portfolio occupancy rates

pub mod client;
pub mod occupancy;
pub mod types;

pub use client::DoorloopClient;
pub use occupancy::{overall_occupancy, property_occupancy};
pub use types::{clean_id, data_array, unique_ids, LeaseOccupancy, OccupancyRate, UnitDetail, UnitsSummary};
