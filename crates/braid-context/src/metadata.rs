//! Thread metadata and interactive-button state.
//!
//! [`ThreadMeta`] is a small key/value store with two flattened fields:
//! `channel` and `channel_type` are common enough that the engine keys
//! behavior off them (direct-message detection, channel attribution on
//! context entries), so string values for those keys land in typed fields
//! while everything else goes into the `extra` map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Channel type marker for direct-message threads.
const DIRECT_CHANNEL_TYPE: &str = "im";

/// Per-thread metadata with flattened channel fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadMeta {
    /// Channel the thread lives in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Channel type (`"im"` marks a direct message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    /// Everything else, verbatim.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ThreadMeta {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one entry, flattening string-valued channel keys.
    ///
    /// A null value clears the entry. Non-string values under `channel` or
    /// `channel_type` are kept in `extra` rather than corrupting the typed
    /// fields.
    pub fn set(&mut self, key: &str, value: Value) {
        match (key, value) {
            ("channel", Value::String(s)) => self.channel = Some(s),
            ("channel", Value::Null) => self.channel = None,
            ("channel_type", Value::String(s)) => self.channel_type = Some(s),
            ("channel_type", Value::Null) => self.channel_type = None,
            (_, Value::Null) => {
                let _ = self.extra.remove(key);
            }
            (_, value) => {
                let _ = self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Look up one entry; flattened fields come back as strings.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "channel" => self.channel.clone().map(Value::String),
            "channel_type" => self.channel_type.clone().map(Value::String),
            _ => self.extra.get(key).cloned(),
        }
    }

    /// Whether the thread lives in a direct-message channel.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.channel_type.as_deref() == Some(DIRECT_CHANNEL_TYPE)
    }
}

/// Lifecycle state of an interactive button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    /// Rendered and awaiting a click.
    Active,
    /// Clicked; the choice is locked in.
    Selected,
}

/// Stored state for one button action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStateEntry {
    /// Current lifecycle state.
    pub state: ButtonState,
    /// Arbitrary payload attached when the state was recorded.
    pub metadata: Map<String, Value>,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_keys_flatten_to_typed_fields() {
        let mut meta = ThreadMeta::new();
        meta.set("channel", json!("C123"));
        meta.set("channel_type", json!("im"));

        assert_eq!(meta.channel.as_deref(), Some("C123"));
        assert_eq!(meta.channel_type.as_deref(), Some("im"));
        assert!(meta.extra.is_empty());
        assert_eq!(meta.get("channel"), Some(json!("C123")));
    }

    #[test]
    fn non_string_channel_value_stays_in_extra() {
        let mut meta = ThreadMeta::new();
        meta.set("channel", json!(42));

        assert!(meta.channel.is_none());
        assert_eq!(meta.extra.get("channel"), Some(&json!(42)));
    }

    #[test]
    fn null_clears_entries() {
        let mut meta = ThreadMeta::new();
        meta.set("channel", json!("C123"));
        meta.set("topic", json!("standup"));
        meta.set("channel", Value::Null);
        meta.set("topic", Value::Null);

        assert!(meta.channel.is_none());
        assert!(meta.get("topic").is_none());
    }

    #[test]
    fn is_direct_matches_im_only() {
        let mut meta = ThreadMeta::new();
        assert!(!meta.is_direct());
        meta.set("channel_type", json!("channel"));
        assert!(!meta.is_direct());
        meta.set("channel_type", json!("im"));
        assert!(meta.is_direct());
    }

    #[test]
    fn button_state_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ButtonState::Active).unwrap(), json!("active"));
        assert_eq!(
            serde_json::to_value(ButtonState::Selected).unwrap(),
            json!("selected")
        );
    }

    #[test]
    fn button_entry_roundtrips() {
        let entry = ButtonStateEntry {
            state: ButtonState::Selected,
            metadata: serde_json::from_value(json!({"choice": "approve"})).unwrap(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["state"], json!("selected"));
        assert_eq!(value["metadata"]["choice"], json!("approve"));
        let back: ButtonStateEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back.state, ButtonState::Selected);
    }
}
