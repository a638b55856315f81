//! Reservation and listing reads backing the dashboard graphs.

use tracing::{info, instrument};

use crate::error::StoreError;
use crate::property::matching::distinct_names;
use crate::store::{Direction, Listing, ReservationPoint, Select, SupabaseClient};

/// Column naming the property a reservation belongs to.
pub const PROPERTY_FULL_NAME: &str = "property_full_name";

/// Paid reservations of one property, oldest first.
#[instrument(skip(store))]
pub async fn reservation_points(
    store: &SupabaseClient,
    table: &str,
    property_full_name: &str,
) -> Result<Vec<ReservationPoint>, StoreError> {
    let query = Select::from(table)
        .columns("total_paid,guesty_created_at")
        .eq(PROPERTY_FULL_NAME, property_full_name)
        .neq("total_paid", "0")
        .order("guesty_created_at", Direction::Asc);

    let points: Vec<ReservationPoint> = store.select_as(&query).await?;
    info!(property = %property_full_name, points = points.len(), "Fetched reservation points");
    Ok(points)
}

/// Distinct property names that have reservations, sorted.
#[instrument(skip(store))]
pub async fn reservation_property_names(store: &SupabaseClient, table: &str) -> Result<Vec<String>, StoreError> {
    let rows = store
        .select(&Select::from(table).columns(PROPERTY_FULL_NAME))
        .await?;

    Ok(distinct_names(&rows, PROPERTY_FULL_NAME).into_iter().collect())
}

/// Every mirrored listing.
#[instrument(skip(store))]
pub async fn listings(store: &SupabaseClient, table: &str) -> Result<Vec<Listing>, StoreError> {
    let listings: Vec<Listing> = store.select_as(&Select::from(table)).await?;
    info!(count = listings.len(), "Fetched listings");
    Ok(listings)
}
