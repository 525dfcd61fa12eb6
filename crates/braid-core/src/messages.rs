//! Message types for the Braid conversation model.
//!
//! [`ContextMessage`] is the canonical record the engine stores for every
//! message in a thread. [`NewMessage`] is the boundary input collaborators
//! hand to `add_message` — everything optional there is filled in by the
//! engine at insertion (ID, timestamp, sequence).
//!
//! ## Design
//!
//! Platform payloads are duck-typed upstream; here they are a tagged
//! [`MessageSource`] / [`MessageKind`] pair validated at the boundary, with
//! an open `metadata` map for forward-compatible platform fields (`channel`,
//! `ts`, reaction names, file URLs, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{MessageId, ThreadId};

// ─────────────────────────────────────────────────────────────────────────────
// Source and kind enums
// ─────────────────────────────────────────────────────────────────────────────

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// A human participant in the thread.
    User,
    /// The assistant itself.
    Assistant,
    /// The engine (synthetic notes, pruning notices).
    System,
    /// A message derived from a tool execution.
    Tool,
}

impl MessageSource {
    /// Returns `true` for messages produced by the assistant side
    /// (the assistant's own posts and its tool activity).
    #[must_use]
    pub fn is_bot(self) -> bool {
        matches!(self, Self::Assistant | Self::Tool)
    }
}

/// What shape of content a message carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// A message that presented interactive buttons.
    ButtonMessage,
    /// A user's click on a button — an explicit choice worth keeping.
    ButtonClick,
    /// An image attachment.
    Image,
    /// A file attachment.
    File,
    /// A synthetic engine note (e.g. a pruning notice).
    SystemNote,
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextMessage — canonical stored record
// ─────────────────────────────────────────────────────────────────────────────

/// A message as stored by the engine.
///
/// `sequence` is assigned exactly once at insertion and never mutated or
/// reused, even after pruning drops the message from the active view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMessage {
    /// Unique message ID.
    pub id: MessageId,
    /// Thread this message belongs to.
    pub thread_id: ThreadId,
    /// When the message was received or created.
    pub timestamp: DateTime<Utc>,
    /// Per-thread total-order position.
    pub sequence: u64,
    /// Who produced the message.
    pub source: MessageSource,
    /// Opaque actor identifier (platform user ID, bot ID, tool name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Display text.
    pub text: String,
    /// Content shape.
    pub kind: MessageKind,
    /// Open platform metadata (`channel`, `ts`, ...).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ContextMessage {
    /// Fetch a string metadata field by key.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NewMessage — boundary input
// ─────────────────────────────────────────────────────────────────────────────

/// Input for inserting a message into the engine.
///
/// Required: `thread_id` and `source` (the source is required by
/// construction — there is no untyped fallback). Everything else is
/// optional and filled in at insertion: `id` (UUID v7), `timestamp`
/// (now), `sequence` (fresh from the thread's sequencer, or
/// `tool_sequence` when the message originates from a recorded tool
/// execution and should interleave at that execution's position).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Thread to insert into. Must be non-empty.
    pub thread_id: ThreadId,
    /// Who produced the message.
    pub source: MessageSource,
    /// Explicit message ID; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Explicit timestamp; `now` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque actor identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Display text.
    #[serde(default)]
    pub text: String,
    /// Content shape. Defaults to [`MessageKind::Text`].
    #[serde(default = "default_kind")]
    pub kind: MessageKind,
    /// Open platform metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Sequence of the tool execution this message originates from.
    ///
    /// When set on a non-user message, the stored message reuses that
    /// sequence instead of drawing a fresh one. User-sourced messages
    /// always draw a fresh sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_sequence: Option<u64>,
}

fn default_kind() -> MessageKind {
    MessageKind::Text
}

impl NewMessage {
    /// Create a bare message for a thread and source.
    #[must_use]
    pub fn new(thread_id: impl Into<ThreadId>, source: MessageSource) -> Self {
        Self {
            thread_id: thread_id.into(),
            source,
            id: None,
            timestamp: None,
            source_id: None,
            text: String::new(),
            kind: MessageKind::Text,
            metadata: Map::new(),
            tool_sequence: None,
        }
    }

    /// Create a user text message.
    #[must_use]
    pub fn user(thread_id: impl Into<ThreadId>, text: impl Into<String>) -> Self {
        Self::new(thread_id, MessageSource::User).with_text(text)
    }

    /// Create an assistant text message.
    #[must_use]
    pub fn assistant(thread_id: impl Into<ThreadId>, text: impl Into<String>) -> Self {
        Self::new(thread_id, MessageSource::Assistant).with_text(text)
    }

    /// Create a system text message.
    #[must_use]
    pub fn system(thread_id: impl Into<ThreadId>, text: impl Into<String>) -> Self {
        Self::new(thread_id, MessageSource::System).with_text(text)
    }

    /// Set the display text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the content kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set an explicit message ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the actor identifier.
    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Set a metadata field.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.metadata.insert(key.into(), value.into());
        self
    }

    /// Tag the message as originating from the tool execution at `sequence`.
    #[must_use]
    pub fn from_tool(mut self, sequence: u64) -> Self {
        self.tool_sequence = Some(sequence);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
