//! Size Estimator Module
//!
//! Approximates the stored size of a payload and provides the whitespace
//! compaction applied to size estimates and snapshots.

use serde_json::{Map, Value};

use crate::error::Result;

const BYTES_PER_MB: f64 = 1_048_576.0;

// == Estimate ==
/// Byte length of the payload's JSON serialization.
///
/// With `compact` set, the compacted form is measured instead, matching what
/// a snapshot would write. The figure ignores map/slot overhead; it only has
/// to be consistent and grow with the payload.
pub fn estimate_size_bytes(value: &Value, compact: bool) -> Result<u64> {
    let bytes = if compact {
        serde_json::to_vec(&compact_value(value))?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes.len() as u64)
}

/// Converts a byte count to megabytes.
pub fn estimate_size_mb(size_bytes: u64) -> f64 {
    size_bytes as f64 / BYTES_PER_MB
}

// == Compaction ==
/// Trims and collapses whitespace runs in every string, except string fields
/// whose name marks them as identifiers.
pub fn compact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(collapse_whitespace(s)),
        Value::Array(items) => Value::Array(items.iter().map(compact_value).collect()),
        Value::Object(fields) => {
            let compacted: Map<String, Value> = fields
                .iter()
                .map(|(name, field)| {
                    let field = match field {
                        Value::String(_) if is_identifier_field(name) => field.clone(),
                        _ => compact_value(field),
                    };
                    (name.clone(), field)
                })
                .collect();
            Value::Object(compacted)
        }
        other => other.clone(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_identifier_field(name: &str) -> bool {
    name == "id" || name == "key" || name.ends_with("_id") || name.ends_with("Id")
}
