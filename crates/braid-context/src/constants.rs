//! Engine constants.
//!
//! Shared defaults for the execution cache, history pruner, and context
//! formatter. Runtime overrides come through `braid-settings`; these are the
//! compiled fallbacks.

// =============================================================================
// Execution Cache
// =============================================================================

/// Maximum cached tool executions per thread before eviction.
pub const DEFAULT_MAX_EXECUTIONS_PER_THREAD: usize = 100;

/// Age in milliseconds past which a cached execution expires (30 minutes).
pub const DEFAULT_EXECUTION_MAX_AGE_MS: u64 = 1_800_000;

/// Tool names whose executions never expire by age.
///
/// These record externally visible side effects (messages the assistant
/// already posted, history it already fetched); forgetting them would make
/// the assistant repeat itself.
pub const DEFAULT_NEVER_EXPIRE_TOOLS: &[&str] = &["post_message", "fetch_history"];

// =============================================================================
// History Pruning
// =============================================================================

/// Active message count that triggers pruning.
pub const DEFAULT_MAX_MESSAGES: usize = 75;

/// Active message count to prune down to.
pub const DEFAULT_TARGET_MESSAGES: usize = 50;

/// Threads at or below this size are never pruned.
pub const DEFAULT_MIN_MESSAGES_TO_KEEP: usize = 10;

/// Template for the synthetic notice appended after pruning.
/// `{count}` is replaced with the number of removed messages.
pub const PRUNE_NOTICE_TEMPLATE: &str =
    "[{count} older messages were removed from this conversation to keep the context focused]";

// =============================================================================
// Context Formatting
// =============================================================================

/// Minimum gap in milliseconds between user messages for a new turn.
pub const DEFAULT_TURN_GAP_MS: u64 = 100;

/// Persona preamble template; `{user}` is replaced with the current
/// correspondent's identifier.
pub const PERSONA_TEMPLATE: &str =
    "You are a helpful assistant in an ongoing conversation with {user}. Continue the \
     conversation naturally, using the available tools when they help.";

/// Fallback correspondent when no user message carries a source ID.
pub const PERSONA_FALLBACK_USER: &str = "the user";

/// Explanatory entry emitted instead of an empty context.
pub const EMPTY_CONTEXT_NOTE: &str =
    "No conversation history is available for this thread yet. Treat the next message as the \
     start of the conversation.";

/// Top-level argument keys stripped from tool entries before serialization.
/// These are internal bookkeeping fields, not part of the tool's contract.
pub const STRIPPED_ARG_KEYS: &[&str] = &["reasoning", "timestamp"];

// =============================================================================
// Snapshots / Digests
// =============================================================================

/// Maximum nesting depth accepted when snapshotting a payload.
pub const MAX_SNAPSHOT_DEPTH: usize = 64;

/// Length of an execution digest in hex characters (128 bits).
pub const DIGEST_HEX_LEN: usize = 32;
