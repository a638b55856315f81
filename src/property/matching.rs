//! Property-name matching and mismatch diagnostics.
//!
//! Rows are selected by exact equality only. Normalization exists so that a
//! failed lookup can point at the stored name the caller probably meant
//! (stray whitespace, different casing, "Apartments" suffix and the like).

use std::collections::BTreeSet;

use serde_json::Value;

/// Whether a stored name selects the row for `requested`.
pub fn is_match(requested: &str, stored: &str) -> bool {
    requested == stored
}

/// Case-folded name with whitespace runs collapsed and ends trimmed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Render a column value as a property name.
pub fn value_as_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Distinct, sorted property names found in `column` across `rows`.
pub fn distinct_names<'a>(rows: impl IntoIterator<Item = &'a Value>, column: &str) -> BTreeSet<String> {
    rows.into_iter()
        .filter_map(|row| row.get(column))
        .filter_map(value_as_name)
        .collect()
}

/// Known names that are not exact matches but look like what was meant.
///
/// A name qualifies when it is equal after normalization, or when one
/// normalized form contains the other.
pub fn close_matches<'a>(requested: &str, known: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let wanted = normalize_name(requested);
    if wanted.is_empty() {
        return Vec::new();
    }

    known
        .into_iter()
        .filter(|name| !is_match(requested, name))
        .filter(|name| {
            let candidate = normalize_name(name);
            !candidate.is_empty()
                && (candidate == wanted || candidate.contains(&wanted) || wanted.contains(&candidate))
        })
        .cloned()
        .collect()
}
