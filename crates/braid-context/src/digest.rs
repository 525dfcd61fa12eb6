//! Canonical argument digests for tool execution dedup.
//!
//! Two invocations of the same tool count as the same execution when their
//! argument maps are deeply equal regardless of key order. The digest makes
//! that an O(1) lookup: arguments are canonicalized (object keys sorted
//! recursively, null object entries dropped) and hashed together with the
//! tool name.
//!
//! The digest is pure and total — `serde_json::Value` cannot represent
//! cycles, so no input can fail to canonicalize.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::constants::DIGEST_HEX_LEN;

/// Compute the digest identifying a tool execution.
///
/// Returns [`DIGEST_HEX_LEN`] lowercase hex characters (128 bits of
/// SHA-256 over `{tool_name}:{canonical_arguments}`).
#[must_use]
pub fn execution_digest(tool_name: &str, arguments: &Map<String, Value>) -> String {
    let mut canonical = String::new();
    canonicalize_map(arguments, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(tool_name.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..DIGEST_HEX_LEN].to_string()
}

/// Canonical JSON form of an argument map.
///
/// Exposed for tests and debugging; [`execution_digest`] is the normal entry
/// point.
#[must_use]
pub fn canonical_arguments(arguments: &Map<String, Value>) -> String {
    let mut out = String::new();
    canonicalize_map(arguments, &mut out);
    out
}

fn canonicalize_map(map: &Map<String, Value>, out: &mut String) {
    out.push('{');
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let mut first = true;
    for key in keys {
        let value = &map[key.as_str()];
        // Nulls in objects are the representation of "absent"
        if value.is_null() {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        canonicalize(value, out);
    }
    out.push('}');
}

fn canonicalize(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => canonicalize_map(map, out),
        Value::Array(items) => {
            // Array positions are meaningful; nulls stay
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonicalize(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
