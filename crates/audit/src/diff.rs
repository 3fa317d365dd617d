//! Field-level change summaries.
//!
//! The stored diff is minimal: only fields whose values differ under
//! structural equality appear, sensitive fields never appear, and values are
//! size-bounded before storage so a caller cannot inflate an audit row.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::entry::FieldChange;

/// Longest string stored in a change summary before truncation.
pub const MAX_STRING_LEN: usize = 500;

/// Longest array stored in a change summary before truncation.
pub const MAX_ARRAY_LEN: usize = 50;

/// Marker appended to a truncated string value.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Fields excluded from change summaries outright.
///
/// Both camelCase and snake_case spellings are listed so snapshots from
/// either serialization convention are covered.
const REDACTED_FIELDS: [&str; 7] = [
    "password",
    "passwordHash",
    "password_hash",
    "token",
    "secret",
    "apiKey",
    "api_key",
];

pub fn is_redacted(field: &str) -> bool {
    REDACTED_FIELDS.contains(&field)
}

/// Compute the minimal diff between two entity snapshots.
///
/// Walks the union of top-level keys of both objects, skips redacted fields,
/// and emits `{field: {from, to}}` only where the values differ structurally.
/// A key missing on one side diffs against `null`. Non-object snapshots are
/// treated as empty.
pub fn change_summary(old_values: &Value, new_values: &Value) -> BTreeMap<String, FieldChange> {
    let empty = Map::new();
    let old_map = old_values.as_object().unwrap_or(&empty);
    let new_map = new_values.as_object().unwrap_or(&empty);

    let keys: std::collections::BTreeSet<&String> =
        old_map.keys().chain(new_map.keys()).collect();

    let mut changes = BTreeMap::new();
    for key in keys {
        if is_redacted(key) {
            continue;
        }

        let before = old_map.get(key.as_str()).unwrap_or(&Value::Null);
        let after = new_map.get(key.as_str()).unwrap_or(&Value::Null);
        if before == after {
            continue;
        }

        changes.insert(
            key.clone(),
            FieldChange {
                from: sanitize_value(before.clone()),
                to: sanitize_value(after.clone()),
            },
        );
    }

    changes
}

/// Bound the size of a value before storage.
///
/// Strings longer than [`MAX_STRING_LEN`] characters are cut to a prefix plus
/// a marker; arrays longer than [`MAX_ARRAY_LEN`] keep their head plus a
/// count-marker element. Applied recursively through arrays and objects.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => {
            if s.chars().count() > MAX_STRING_LEN {
                let prefix: String = s.chars().take(MAX_STRING_LEN).collect();
                Value::String(format!("{prefix}{TRUNCATION_MARKER}"))
            } else {
                Value::String(s)
            }
        }
        Value::Array(items) => {
            let total = items.len();
            let mut kept: Vec<Value> = items
                .into_iter()
                .take(MAX_ARRAY_LEN)
                .map(sanitize_value)
                .collect();
            if total > MAX_ARRAY_LEN {
                kept.push(Value::String(format!(
                    "... ({} more items truncated)",
                    total - MAX_ARRAY_LEN
                )));
            }
            Value::Array(kept)
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect(),
        ),
        other => other,
    }
}
