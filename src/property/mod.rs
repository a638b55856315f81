//! Property lookups over the unit tables.

pub mod lookup;
pub mod matching;

pub use lookup::{units_for_property, UnitTables, UnitsLookup};
pub use matching::{close_matches, is_match, normalize_name};
