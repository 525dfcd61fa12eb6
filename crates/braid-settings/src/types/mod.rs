//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format. Each type implements [`Default`] with production default values.
//! Types marked with `#[serde(default)]` allow partial JSON — missing fields
//! get their default value during deserialization.

mod engine;

pub use engine::*;

use serde::{Deserialize, Serialize};

/// Root settings type for Braid.
///
/// Loaded from `~/.braid/settings.json` with defaults applied for missing
/// fields. `BRAID_*` environment variables can override specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "engine": { "prune": { "maxMessages": 100 } }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BraidSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Context engine settings.
    pub engine: EngineSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for BraidSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "braid".to_string(),
            engine: EngineSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_versioned() {
        let settings = BraidSettings::default();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.name, "braid");
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn serde_roundtrip_preserves_defaults() {
        let settings = BraidSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: BraidSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.engine.prune.max_messages, 75);
        assert_eq!(back.engine.cache.max_executions_per_thread, 100);
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(BraidSettings::default()).unwrap();
        assert!(json["engine"]["cache"].get("maxExecutionsPerThread").is_some());
        assert!(json["engine"]["prune"].get("minMessagesToKeep").is_some());
        assert!(json["engine"]["format"].get("turnGapMs").is_some());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let settings: BraidSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.engine.prune.target_messages, 50);
    }
}
