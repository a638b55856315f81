//! Propolis property data gateway.
//!
//! Backend for the Propolis property-management dashboard. It reads unit,
//! reservation, listing and lease data from a Supabase-hosted store, proxies
//! DoorLoop for occupancy rates and Guesty for listings, reservations and
//! users, and issues dashboard session tokens.
//!
//! # Status contract
//!
//! ```text
//! GET /health                          always 200 while the process is up
//! GET /db/health-check                 always 200; credential and table checks as data
//! GET /db/units-for-property?property  200 with units (maybe empty) + debug,
//!                                      503 "configuration" when the store is unusable
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: Supabase (PostgREST) client and query builder
//! - [`property`]: Units-for-property lookup and name-match hints
//! - [`diagnostics`]: Credential and table health report
//! - [`reservations`]: Reservation and listing reads
//! - [`longterm`]: Long-term lease filter with rollups
//! - [`occupancy`]: Lease dates, overlap and occupancy math
//! - [`doorloop`]: DoorLoop client and occupancy rates
//! - [`guesty`]: Guesty Open API proxy
//! - [`auth`]: Session JWTs
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod config;
pub mod diagnostics;
pub mod doorloop;
pub mod error;
pub mod guesty;
pub mod longterm;
pub mod metrics;
pub mod occupancy;
pub mod property;
pub mod reservations;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};
