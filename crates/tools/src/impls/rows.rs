//! Helpers for picking rows out of upstream payloads.

use insight_core::{CoreError, CoreResult};
use serde_json::{Map, Value};

/// The row array of a payload: the payload itself if it is an array,
/// otherwise the first of `fields` holding an array.
pub(crate) fn rows_of<'a>(payload: &'a Value, fields: &[&str], path: &str) -> CoreResult<&'a Vec<Value>> {
    if let Value::Array(rows) = payload {
        return Ok(rows);
    }
    fields
        .iter()
        .find_map(|f| payload.get(*f).and_then(Value::as_array))
        .ok_or_else(|| {
            CoreError::parse(format!(
                "response from {} has no '{}' array",
                path,
                fields.join("' / '")
            ))
        })
}

/// Identifier of a row, from `chain_id`, `chain` or `id`.
pub(crate) fn row_chain(row: &Value) -> Option<&str> {
    ["chain_id", "chain", "id"]
        .iter()
        .find_map(|k| row.get(*k).and_then(Value::as_str))
}

/// Rows belonging to `chain_id` (case-insensitive).
pub(crate) fn rows_for_chain<'a>(rows: &'a [Value], chain_id: &str) -> Vec<&'a Value> {
    rows.iter()
        .filter(|row| row_chain(row).is_some_and(|c| c.eq_ignore_ascii_case(chain_id)))
        .collect()
}

/// Top-level scalar fields of an object payload.
pub(crate) fn scalar_fields(payload: &Value) -> Map<String, Value> {
    payload
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(_, v)| !v.is_array() && !v.is_object())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}
