//! Depth-capped payload snapshots.
//!
//! Tool results and argument maps are stored and handed out by value so that
//! callers can never mutate engine state through a shared reference. The copy
//! is guarded by a nesting-depth cap: a pathologically nested payload is
//! rejected with a specific error instead of being stored in a form that
//! later stages would mangle or blow the stack on.

use braid_core::{EngineError, Result};
use serde_json::{Map, Value};

use crate::constants::MAX_SNAPSHOT_DEPTH;

/// Deep-copy a value, rejecting nesting beyond [`MAX_SNAPSHOT_DEPTH`].
pub fn snapshot_value(value: &Value) -> Result<Value> {
    check_depth(value, 0)?;
    Ok(value.clone())
}

/// Deep-copy an argument map, rejecting nesting beyond [`MAX_SNAPSHOT_DEPTH`].
pub fn snapshot_map(map: &Map<String, Value>) -> Result<Map<String, Value>> {
    for value in map.values() {
        check_depth(value, 1)?;
    }
    Ok(map.clone())
}

fn check_depth(value: &Value, depth: usize) -> Result<()> {
    if depth > MAX_SNAPSHOT_DEPTH {
        return Err(EngineError::serialization(format!(
            "value nesting exceeds depth {MAX_SNAPSHOT_DEPTH}"
        )));
    }
    match value {
        Value::Object(map) => map.values().try_for_each(|v| check_depth(v, depth + 1)),
        Value::Array(items) => items.iter().try_for_each(|v| check_depth(v, depth + 1)),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
