//! Engine configuration, operation inputs, and serialized output types.
//!
//! [`EngineConfig`] is the engine's complete tuning surface. It defaults to
//! the compiled constants and can be populated from `braid-settings` via
//! [`EngineConfig::from_settings`] — the engine itself never touches settings
//! or the environment.

use braid_core::{ExecutionStatus, MessageId, MessageKind, ThreadId};
use braid_settings::EngineSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_EXECUTION_MAX_AGE_MS, DEFAULT_MAX_EXECUTIONS_PER_THREAD, DEFAULT_MAX_MESSAGES,
    DEFAULT_MIN_MESSAGES_TO_KEEP, DEFAULT_NEVER_EXPIRE_TOOLS, DEFAULT_TARGET_MESSAGES,
    DEFAULT_TURN_GAP_MS, PERSONA_TEMPLATE,
};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Complete engine configuration.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    /// Tool execution cache tuning.
    pub cache: CacheConfig,
    /// History pruning tuning.
    pub prune: PruneConfig,
    /// Context serialization tuning.
    pub format: FormatConfig,
}

impl EngineConfig {
    /// Build an engine config from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            cache: CacheConfig {
                max_executions_per_thread: settings.cache.max_executions_per_thread,
                max_age_ms: settings.cache.max_age_ms,
                never_expire_tools: settings.cache.never_expire_tools.clone(),
            },
            prune: PruneConfig {
                max_messages: settings.prune.max_messages,
                target_messages: settings.prune.target_messages,
                min_messages_to_keep: settings.prune.min_messages_to_keep,
                keep_root: settings.prune.keep_root,
                always_keep_kinds: settings.prune.always_keep_kinds.clone(),
            },
            format: FormatConfig {
                turn_gap_ms: settings.format.turn_gap_ms,
                persona_template: settings.format.persona_template.clone(),
            },
        }
    }
}

/// Tool execution cache tuning.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Maximum cached executions per thread before eviction.
    pub max_executions_per_thread: usize,
    /// Age in milliseconds past which a cached execution expires.
    pub max_age_ms: u64,
    /// Tool names whose executions never expire by age.
    pub never_expire_tools: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_executions_per_thread: DEFAULT_MAX_EXECUTIONS_PER_THREAD,
            max_age_ms: DEFAULT_EXECUTION_MAX_AGE_MS,
            never_expire_tools: DEFAULT_NEVER_EXPIRE_TOOLS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl CacheConfig {
    /// Whether executions of `tool_name` are exempt from age eviction.
    #[must_use]
    pub fn is_never_expire(&self, tool_name: &str) -> bool {
        self.never_expire_tools.iter().any(|t| t == tool_name)
    }
}

/// History pruning tuning.
#[derive(Clone, Debug)]
pub struct PruneConfig {
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

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            target_messages: DEFAULT_TARGET_MESSAGES,
            min_messages_to_keep: DEFAULT_MIN_MESSAGES_TO_KEEP,
            keep_root: true,
            always_keep_kinds: vec![MessageKind::ButtonClick, MessageKind::SystemNote],
        }
    }
}

/// Context serialization tuning.
#[derive(Clone, Debug)]
pub struct FormatConfig {
    /// Minimum gap in milliseconds between user messages for a new turn.
    pub turn_gap_ms: u64,
    /// Persona preamble template; `{user}` is replaced with the current
    /// correspondent's identifier.
    pub persona_template: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            turn_gap_ms: DEFAULT_TURN_GAP_MS,
            persona_template: PERSONA_TEMPLATE.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operation inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Options for building a serialized context.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Only include the most recent N messages.
    pub limit: Option<usize>,
    /// Include messages produced by the assistant side.
    pub include_bot_messages: bool,
    /// Include recorded tool executions in the timeline.
    pub include_tool_calls: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            limit: None,
            include_bot_messages: true,
            include_tool_calls: true,
        }
    }
}

/// Input for recording a tool execution.
#[derive(Clone, Debug)]
pub struct NewExecution {
    /// Thread the execution belongs to. Must be non-empty.
    pub thread_id: ThreadId,
    /// Name of the invoked tool. Must be non-empty.
    pub tool_name: String,
    /// Arguments as passed to the tool.
    pub arguments: Map<String, Value>,
    /// Result payload, when the tool produced one.
    pub result: Option<Value>,
    /// Failure description, when the tool failed.
    pub error: Option<String>,
    /// Whether the tool was deliberately not run.
    pub skipped: bool,
}

impl NewExecution {
    /// Create an execution record input with empty arguments.
    #[must_use]
    pub fn new(thread_id: impl Into<ThreadId>, tool_name: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            tool_name: tool_name.into(),
            arguments: Map::new(),
            result: None,
            error: None,
            skipped: false,
        }
    }

    /// Replace the argument map.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Set a single argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.arguments.insert(key.into(), value.into());
        self
    }

    /// Attach the tool's result payload.
    #[must_use]
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach a failure description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Mark the execution as deliberately skipped.
    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.skipped = true;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serialized output
// ─────────────────────────────────────────────────────────────────────────────

/// Role attributed to a context entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    /// Entry originates from the human side.
    User,
    /// Entry originates from the assistant side (including tool activity).
    Assistant,
    /// Entry is engine- or platform-synthesized.
    System,
}

/// One unit of serialized context handed to the LLM caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    /// Position in the serialized context, strictly increasing from 0.
    pub index: usize,
    /// Conversational turn the entry belongs to; lead entries are turn 0.
    pub turn: usize,
    /// Timestamp attributed to the entry.
    pub timestamp: DateTime<Utc>,
    /// Role attributed to the entry.
    pub role: EntryRole,
    /// Typed payload.
    pub content: EntryContent,
}

/// Typed payload of a [`ContextEntry`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EntryContent {
    /// Thread statistics, always the first entry of a non-empty context.
    #[serde(rename_all = "camelCase")]
    Stats {
        /// Number of active messages in the thread.
        total_messages: usize,
        /// Number of active user-sourced messages.
        user_messages: usize,
        /// Number of active assistant-sourced messages.
        assistant_messages: usize,
        /// Number of cached tool executions.
        tool_calls: usize,
        /// Whether the thread is a direct (one-on-one) conversation.
        is_direct: bool,
        /// Whether this is the very first message of the thread.
        is_first_contact: bool,
    },
    /// Persona preamble, always the second entry of a non-empty context.
    #[serde(rename_all = "camelCase")]
    Persona {
        /// Rendered persona text.
        text: String,
    },
    /// A conversation message.
    #[serde(rename_all = "camelCase")]
    Message {
        /// Display text.
        text: String,
        /// ID of the underlying message.
        message_id: MessageId,
        /// Platform timestamp, when the message carried one.
        #[serde(skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
        /// Channel the message was seen in.
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
    },
    /// A recorded tool execution.
    #[serde(rename_all = "camelCase")]
    ToolCall {
        /// Name of the invoked tool.
        tool_name: String,
        /// Outcome classification.
        status: ExecutionStatus,
        /// Arguments with internal-only keys stripped.
        arguments: Map<String, Value>,
        /// Result payload snapshot.
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    /// An explanatory note (e.g. the empty-context fallback).
    #[serde(rename_all = "camelCase")]
    Note {
        /// Note text.
        text: String,
    },
}

/// Per-source message counts for a thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    /// Number of active messages.
    pub total_messages: usize,
    /// Active messages from users.
    pub user_messages: usize,
    /// Active messages from the assistant.
    pub assistant_messages: usize,
    /// Active engine- or platform-synthesized messages.
    pub system_messages: usize,
    /// Active messages derived from tool executions.
    pub tool_messages: usize,
    /// Whether the thread has no active messages.
    pub is_empty: bool,
}

impl Default for ThreadSummary {
    fn default() -> Self {
        Self {
            total_messages: 0,
            user_messages: 0,
            assistant_messages: 0,
            system_messages: 0,
            tool_messages: 0,
            is_empty: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
