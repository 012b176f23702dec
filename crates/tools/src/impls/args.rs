//! Argument extraction shared by the dashboard tools.

use insight_core::{CoreError, CoreResult};
use serde_json::Value;

/// Longest identifier accepted in a path segment.
const MAX_ID_LEN: usize = 64;

/// Required identifier that is interpolated into an upstream path.
pub(crate) fn required_id(args: &Value, field: &str) -> CoreResult<String> {
    optional_id(args, field)?
        .ok_or_else(|| CoreError::validation(format!("missing required argument '{}'", field)))
}

pub(crate) fn optional_id(args: &Value, field: &str) -> CoreResult<Option<String>> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if s.len() > MAX_ID_LEN
                || !s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(CoreError::validation(format!(
                    "argument '{}' must match [A-Za-z0-9_-]{{1,{}}}",
                    field, MAX_ID_LEN
                )));
            }
            Ok(Some(s.to_ascii_lowercase()))
        }
        Some(other) => Err(CoreError::validation(format!(
            "argument '{}' must be a string, got {}",
            field, other
        ))),
    }
}

/// Optional positive integer clamped to `[1, max]`.
pub(crate) fn optional_count(args: &Value, field: &str, max: u64) -> CoreResult<Option<u64>> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let n = v
                .as_u64()
                .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or_else(|| {
                    CoreError::validation(format!("argument '{}' must be a positive integer", field))
                })?;
            Ok(Some(n.clamp(1, max)))
        }
    }
}
