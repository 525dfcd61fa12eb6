//! Context engine settings.
//!
//! Configuration for the tool execution cache, history pruning, and context
//! serialization. The engine consumes these through its own config types; it
//! never reads settings (or the environment) directly.

use braid_core::MessageKind;
use serde::{Deserialize, Serialize};

/// Container for all engine settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Tool execution cache settings.
    pub cache: CacheSettings,
    /// History pruning settings.
    pub prune: PruneSettings,
    /// Context serialization settings.
    pub format: FormatSettings,
}

/// Tool execution cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Maximum cached executions per thread before eviction.
    pub max_executions_per_thread: usize,
    /// Age in milliseconds past which a cached execution expires.
    pub max_age_ms: u64,
    /// Tool names whose executions never expire by age.
    pub never_expire_tools: Vec<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_executions_per_thread: 100,
            max_age_ms: 1_800_000,
            never_expire_tools: vec!["post_message".to_string(), "fetch_history".to_string()],
        }
    }
}

/// History pruning settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PruneSettings {
    /// Active message count that triggers pruning.
    pub max_messages: usize,
    /// Active message count to prune down to.
    pub target_messages: usize,
    /// Threads at or below this size are never pruned.
    pub min_messages_to_keep: usize,
    /// Whether the first message of a thread is always kept.
    pub keep_root: bool,
    /// Message kinds that are always kept regardless of age.
    pub always_keep_kinds: Vec<MessageKind>,
}

impl Default for PruneSettings {
    fn default() -> Self {
        Self {
            max_messages: 75,
            target_messages: 50,
            min_messages_to_keep: 10,
            keep_root: true,
            always_keep_kinds: vec![MessageKind::ButtonClick, MessageKind::SystemNote],
        }
    }
}

/// Context serialization settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatSettings {
    /// Minimum gap in milliseconds between user messages for a new turn.
    pub turn_gap_ms: u64,
    /// Persona preamble template; `{user}` is replaced with the current
    /// correspondent's identifier.
    pub persona_template: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            turn_gap_ms: 100,
            persona_template: "You are a helpful assistant in an ongoing conversation with {user}. \
                               Continue the conversation naturally, using the available tools when \
                               they help."
                .to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
