//! Typed rows of store tables the dashboard reads directly.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One point of the revenue graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReservationPoint {
    /// Booking timestamp as stored.
    #[serde(default)]
    pub guesty_created_at: Option<String>,
    /// Amount paid.
    #[serde(default)]
    pub total_paid: Option<f64>,
}

/// Guesty listing mirrored into the store. Unknown columns are ignored.
///
/// Timestamps are kept as the store renders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: String,
    pub account_id: String,
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: Option<String>,
    #[serde(default)]
    pub imported_at: Option<String>,
    #[serde(default)]
    pub last_activity_at: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub room_type: Option<String>,

    #[serde(default)]
    pub accommodates: Option<i64>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    /// Half baths make this fractional.
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub area_square_feet: Option<f64>,
    #[serde(default)]
    pub minimum_age: Option<i64>,

    #[serde(default)]
    pub complex_id: Option<String>,
    #[serde(default)]
    pub cleaning_status: Option<String>,
    #[serde(default)]
    pub active: Option<String>,

    #[serde(default)]
    pub address_building_name: Option<String>,
    #[serde(default)]
    pub address_city: Option<String>,
    #[serde(default)]
    pub address_state: Option<String>,
    #[serde(default)]
    pub address_neighborhood: Option<String>,
    #[serde(default)]
    pub address_latitude: Option<String>,
    #[serde(default)]
    pub address_longitude: Option<String>,
    #[serde(default)]
    pub address_full: Option<String>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub weekly_price_factor: Option<f64>,
    #[serde(default)]
    pub monthly_price_factor: Option<f64>,
    #[serde(default)]
    pub extra_person_fee: Option<f64>,
    #[serde(default)]
    pub security_deposit_fee: Option<f64>,

    #[serde(default)]
    pub guests_included: Option<i64>,
    #[serde(default)]
    pub min_nights: Option<i64>,
    #[serde(default)]
    pub max_nights: Option<i64>,

    #[serde(default)]
    pub description_summary: Option<String>,

    #[serde(default)]
    pub payment_provider_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub account_taxes: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub amenities: Vec<String>,
}
