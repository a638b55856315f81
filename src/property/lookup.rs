//! Units-for-property lookup across the unit tables.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::StoreError;
use crate::metrics;
use crate::store::{Select, SupabaseClient};

use super::matching::{close_matches, distinct_names, normalize_name};

/// Which tables to read and which column names the property.
#[derive(Debug, Clone)]
pub struct UnitTables {
    /// Table names, queried in order.
    pub tables: Vec<String>,
    /// Column holding the property name.
    pub property_column: String,
}

/// One matching row, tagged with its table.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UnitRow {
    /// Table the row came from.
    pub source: String,
    /// The row as stored.
    #[schema(value_type = Object)]
    pub record: Value,
}

/// Per-table match statistics.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TableMatch {
    /// Table name.
    pub table: String,
    /// Rows matching the requested name.
    pub matched: usize,
    /// Distinct property names present in the table.
    pub distinct_names: usize,
}

/// Diagnostics attached to every lookup.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LookupDebug {
    /// Name as received.
    pub requested: String,
    /// Name after normalization (what close matches compare against).
    pub normalized: String,
    /// Always "exact": rows are selected by exact equality.
    #[schema(value_type = String)]
    pub match_mode: &'static str,
    /// Column compared against.
    pub property_column: String,
    /// Per-table statistics.
    pub tables: Vec<TableMatch>,
    /// Every distinct property name in the unit tables.
    pub known_property_names: Vec<String>,
    /// Known names that nearly match the request.
    pub close_matches: Vec<String>,
}

/// Result of a units-for-property lookup.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UnitsLookup {
    /// Requested property name.
    pub property: String,
    /// Number of matching rows across all tables.
    pub count: usize,
    /// Matching rows, STR table first.
    pub units: Vec<UnitRow>,
    /// Diagnostics for name mismatches.
    pub debug: LookupDebug,
}

/// Raw rows fetched from one table.
#[derive(Debug, Clone, Default)]
pub struct TableRows {
    /// Table name.
    pub table: String,
    /// Rows matching the property exactly.
    pub matched: Vec<Value>,
    /// Property-column projection of every row.
    pub names: Vec<Value>,
}

/// Look up units of `property` in every unit table.
///
/// Store failures surface as errors; an empty match does not.
#[instrument(skip(store, layout))]
pub async fn units_for_property(
    store: &SupabaseClient,
    layout: &UnitTables,
    property: &str,
) -> Result<UnitsLookup, StoreError> {
    let fetches = layout
        .tables
        .iter()
        .map(|table| fetch_table(store, table, &layout.property_column, property));

    let per_table = futures::future::try_join_all(fetches).await?;
    let lookup = assemble(property, &layout.property_column, per_table);

    if lookup.count == 0 {
        metrics::inc_unmatched_lookups();
        warn!(
            property = %property,
            known = lookup.debug.known_property_names.len(),
            close = ?lookup.debug.close_matches,
            "No units matched property"
        );
    } else {
        info!(property = %property, count = lookup.count, "Units matched property");
    }

    Ok(lookup)
}

async fn fetch_table(
    store: &SupabaseClient,
    table: &str,
    column: &str,
    property: &str,
) -> Result<TableRows, StoreError> {
    let matching = Select::from(table).eq(column, property);
    let names = Select::from(table).columns(column);

    let (matched, names) = tokio::try_join!(store.select(&matching), store.select(&names))?;

    Ok(TableRows {
        table: table.to_string(),
        matched,
        names,
    })
}

/// Combine per-table results into the lookup response.
pub fn assemble(property: &str, column: &str, per_table: Vec<TableRows>) -> UnitsLookup {
    let mut units = Vec::new();
    let mut tables = Vec::with_capacity(per_table.len());
    let mut known = std::collections::BTreeSet::new();

    for TableRows { table, matched, names } in per_table {
        let table_names = distinct_names(&names, column);
        tables.push(TableMatch {
            table: table.clone(),
            matched: matched.len(),
            distinct_names: table_names.len(),
        });
        known.extend(table_names);

        units.extend(matched.into_iter().map(|record| UnitRow {
            source: table.clone(),
            record,
        }));
    }

    let close = close_matches(property, &known);

    UnitsLookup {
        property: property.to_string(),
        count: units.len(),
        units,
        debug: LookupDebug {
            requested: property.to_string(),
            normalized: normalize_name(property),
            match_mode: "exact",
            property_column: column.to_string(),
            tables,
            known_property_names: known.into_iter().collect(),
            close_matches: close,
        },
    }
}
