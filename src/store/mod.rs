//! Hosted store access (Supabase over PostgREST).
//!
//! This module handles:
//! - Query construction in PostgREST syntax
//! - Authenticated table reads and RPC calls
//! - Classification of store failures
//! - Typed rows for tables read as-is

pub mod client;
pub mod models;
pub mod query;

pub use client::{AuthSession, SupabaseClient};
pub use models::{Listing, ReservationPoint};
pub use query::{Direction, Select};
