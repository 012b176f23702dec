//! Output Truncation
//!
//! Tool results feed a model with a finite context budget, so every result
//! is bounded before it leaves the executor:
//!
//! - arrays are capped to a prefix of `max_items`
//! - below `keep_depth`, any array/object whose serialized size still
//!   exceeds `max_nested_bytes` after its own children were compacted is
//!   replaced with a summary token: `"[N items]"` or `"{N keys: a, b, ...}"`
//! - objects with more than `max_object_keys` keys are summarized below
//!   `keep_depth`; above it they keep their first keys plus an
//!   `OMITTED_KEYS_FIELD` count
//! - strings longer than `max_string_chars` are cut with a trailing `…`

use serde_json::{Map, Value};

/// Keys listed in an object summary token.
const SUMMARY_KEY_LIMIT: usize = 10;

/// Added to a capped shallow object; holds the number of dropped keys.
pub const OMITTED_KEYS_FIELD: &str = "_omitted_keys";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationPolicy {
    pub max_items: usize,
    pub max_nested_bytes: usize,
    pub max_string_chars: usize,
    pub max_object_keys: usize,
    /// Containers shallower than this are capped but never summarized.
    /// Depth 0 is the result itself, depth 1 its direct fields.
    pub keep_depth: usize,
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            max_items: 20,
            max_nested_bytes: 2048,
            max_string_chars: 512,
            max_object_keys: 40,
            keep_depth: 2,
        }
    }
}

impl TruncationPolicy {
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_max_nested_bytes(mut self, bytes: usize) -> Self {
        self.max_nested_bytes = bytes;
        self
    }

    pub fn with_keep_depth(mut self, depth: usize) -> Self {
        self.keep_depth = depth;
        self
    }
}

/// Apply `policy` to a tool result.
pub fn truncate_value(value: &Value, policy: &TruncationPolicy) -> Value {
    compact(value, policy, 0)
}

fn compact(value: &Value, policy: &TruncationPolicy, depth: usize) -> Value {
    let summarizable = depth >= policy.keep_depth;
    if let Value::Object(map) = value {
        if summarizable && map.len() > policy.max_object_keys {
            return summarize(value);
        }
    }

    let compacted = match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(policy.max_items)
                .map(|item| compact(item, policy, depth + 1))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out: Map<String, Value> = map
                .iter()
                .take(policy.max_object_keys)
                .map(|(k, v)| (k.clone(), compact(v, policy, depth + 1)))
                .collect();
            if map.len() > policy.max_object_keys {
                out.insert(
                    OMITTED_KEYS_FIELD.to_string(),
                    Value::from(map.len() - policy.max_object_keys),
                );
            }
            Value::Object(out)
        }
        Value::String(s) => return truncate_string(s, policy.max_string_chars),
        other => return other.clone(),
    };

    if summarizable && serialized_len(&compacted) > policy.max_nested_bytes {
        // Summarize from the original so counts reflect what the upstream sent.
        summarize(value)
    } else {
        compacted
    }
}

/// Compact stand-in for an oversized container.
pub fn summarize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::String(format!("[{} items]", items.len())),
        Value::Object(map) => {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).take(SUMMARY_KEY_LIMIT).collect();
            if map.len() > SUMMARY_KEY_LIMIT {
                keys.push("...");
            }
            Value::String(format!("{{{} keys: {}}}", map.len(), keys.join(", ")))
        }
        other => other.clone(),
    }
}

fn truncate_string(s: &str, max_chars: usize) -> Value {
    if s.chars().count() <= max_chars {
        return Value::String(s.to_string());
    }
    let mut cut: String = s.chars().take(max_chars).collect();
    cut.push('…');
    Value::String(cut)
}

fn serialized_len(value: &Value) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(usize::MAX)
}
