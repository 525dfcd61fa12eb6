//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BraidSettings::default()`]
//! 2. If `~/.braid/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BraidSettings;

/// Resolve the path to the settings file (`~/.braid/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".braid").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BraidSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<BraidSettings> {
    let defaults = serde_json::to_value(BraidSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BraidSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut BraidSettings) {
    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("BRAID_LOG_LEVEL") {
        settings.logging.level = v;
    }

    // ── Execution cache ─────────────────────────────────────────────
    if let Some(v) = read_env_usize("BRAID_MAX_EXECUTIONS", 1, 100_000) {
        settings.engine.cache.max_executions_per_thread = v;
    }
    if let Some(v) = read_env_u64("BRAID_EXECUTION_MAX_AGE_MS", 1000, 86_400_000) {
        settings.engine.cache.max_age_ms = v;
    }

    // ── Pruning ─────────────────────────────────────────────────────
    if let Some(v) = read_env_usize("BRAID_MAX_MESSAGES", 1, 10_000) {
        settings.engine.prune.max_messages = v;
    }
    if let Some(v) = read_env_usize("BRAID_TARGET_MESSAGES", 1, 10_000) {
        settings.engine.prune.target_messages = v;
    }
    if let Some(v) = read_env_usize("BRAID_MIN_MESSAGES", 1, 10_000) {
        settings.engine.prune.min_messages_to_keep = v;
    }
    if let Some(v) = read_env_bool("BRAID_KEEP_ROOT") {
        settings.engine.prune.keep_root = v;
    }

    // ── Formatting ──────────────────────────────────────────────────
    if let Some(v) = read_env_u64("BRAID_TURN_GAP_MS", 0, 60_000) {
        settings.engine.format.turn_gap_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "prune": {"maxMessages": 75, "keepRoot": true}
        });
        let source = serde_json::json!({
            "prune": {"maxMessages": 100}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["prune"]["maxMessages"], 100);
        assert_eq!(merged["prune"]["keepRoot"], true);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"tools": ["post_message", "fetch_history"]});
        let source = serde_json::json!({"tools": ["search"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["tools"], serde_json::json!(["search"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 42);
    }

    #[test]
    fn merge_empty_source() {
        let target = serde_json::json!({"a": 1, "b": {"c": 2}});
        let source = serde_json::json!({});
        let merged = deep_merge(target.clone(), source);
        assert_eq!(merged, target);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/settings.json");
        let settings = load_settings_from_path(path).unwrap();
        let defaults = BraidSettings::default();
        assert_eq!(settings.version, defaults.version);
        assert_eq!(
            settings.engine.prune.max_messages,
            defaults.engine.prune.max_messages
        );
    }

    #[test]
    fn load_empty_json_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{}").unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.engine.cache.max_executions_per_thread, 100);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"engine": {"prune": {"maxMessages": 120}}, "logging": {"level": "debug"}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.engine.prune.max_messages, 120);
        assert_eq!(settings.logging.level, "debug");
        // Untouched siblings keep their defaults
        assert_eq!(settings.engine.prune.target_messages, 50);
        assert_eq!(settings.engine.cache.max_age_ms, 1_800_000);
    }

    #[test]
    fn load_array_replace_not_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"engine": {"cache": {"neverExpireTools": ["search"]}}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.engine.cache.never_expire_tools, ["search"]);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    // ── parse_bool ──────────────────────────────────────────────────

    #[test]
    fn parse_bool_true_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "Yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
    }

    #[test]
    fn parse_bool_false_variants() {
        for val in &["false", "0", "no", "off", "FALSE", "No", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
    }

    #[test]
    fn parse_bool_invalid() {
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("2"), None);
    }

    // ── parse_u64_range ─────────────────────────────────────────────

    #[test]
    fn parse_u64_valid() {
        assert_eq!(parse_u64_range("1800000", 1000, 86_400_000), Some(1_800_000));
        assert_eq!(parse_u64_range("1000", 1000, 86_400_000), Some(1000));
    }

    #[test]
    fn parse_u64_out_of_range() {
        assert_eq!(parse_u64_range("500", 1000, 86_400_000), None);
        assert_eq!(parse_u64_range("96400000000", 1000, 86_400_000), None);
    }

    #[test]
    fn parse_u64_invalid() {
        assert_eq!(parse_u64_range("abc", 1000, 86_400_000), None);
        assert_eq!(parse_u64_range("", 1000, 86_400_000), None);
    }

    // ── parse_usize_range ───────────────────────────────────────────

    #[test]
    fn parse_usize_valid() {
        assert_eq!(parse_usize_range("75", 1, 10_000), Some(75));
    }

    #[test]
    fn parse_usize_out_of_range() {
        assert_eq!(parse_usize_range("0", 1, 10_000), None);
        assert_eq!(parse_usize_range("20000", 1, 10_000), None);
    }
}
