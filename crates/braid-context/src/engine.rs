//! The engine facade.
//!
//! [`ContextEngine`] owns every thread's state behind a
//! `DashMap<ThreadId, Arc<Mutex<ThreadState>>>`: the map locates a thread
//! without blocking unrelated threads, and the per-entry mutex makes each
//! operation atomic for its thread. All operations are synchronous and do
//! no I/O; collaborators get owned clones back, never references into the
//! engine's maps.
//!
//! Read operations never create thread state — asking about an unknown
//! thread returns empty/`None`/zero. Write operations create the thread
//! lazily on first use.

use std::sync::Arc;

use braid_core::{
    ActionId, ContextMessage, EngineError, MessageId, MessageKind, MessageSource, NewMessage,
    Result, ThreadId, ToolExecutionRecord,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::constants::PRUNE_NOTICE_TEMPLATE;
use crate::digest::execution_digest;
use crate::formatter;
use crate::metadata::{ButtonState, ButtonStateEntry};
use crate::pruner;
use crate::snapshot::{snapshot_map, snapshot_value};
use crate::thread_state::ThreadState;
use crate::types::{BuildOptions, ContextEntry, EngineConfig, NewExecution, ThreadSummary};

/// Thread-scoped context engine.
///
/// One instance serves every live conversation thread in the process.
/// Construct it once (usually from loaded settings) and share it behind an
/// `Arc`:
///
/// ```ignore
/// let engine = ContextEngine::with_config(EngineConfig::from_settings(
///     &braid_settings::get_settings().engine,
/// ));
/// ```
pub struct ContextEngine {
    config: EngineConfig,
    threads: DashMap<ThreadId, Arc<Mutex<ThreadState>>>,
}

impl ContextEngine {
    /// Create an engine with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with explicit configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            threads: DashMap::new(),
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of threads with live state.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    // ─── inbound ────────────────────────────────────────────────────────────

    /// Record a message in its thread.
    ///
    /// Fills in ID (UUID v7), timestamp (now) and sequence when absent.
    /// A message tagged with `tool_sequence` interleaves at its execution's
    /// position instead of drawing a fresh sequence, unless it is
    /// user-sourced. Re-inserting an already-stored ID is a no-op returning
    /// the existing ID, so delivery replays cannot duplicate history.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `thread_id` is empty.
    #[instrument(skip(self, new), fields(thread_id = %new.thread_id))]
    pub fn add_message(&self, new: NewMessage) -> Result<MessageId> {
        if new.thread_id.is_empty() {
            return Err(EngineError::validation("thread_id", "must be non-empty"));
        }
        let shared = self.state_or_create(&new.thread_id);
        let mut state = shared.lock();
        Ok(Self::insert_message(&mut state, new))
    }

    /// Record a tool execution and return its assigned sequence.
    ///
    /// Arguments and result are snapshotted (depth-capped) and digested
    /// before a sequence is drawn, so a rejected payload burns no sequence.
    /// A repeat execution with a deep-equal argument map replaces its
    /// predecessor in the cache. When the cache exceeds its cap the engine
    /// evicts immediately.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `thread_id` or `tool_name` is empty,
    /// and a serialization error when a payload nests too deeply.
    #[instrument(
        skip(self, exec),
        fields(thread_id = %exec.thread_id, tool = %exec.tool_name)
    )]
    pub fn record_tool_execution(&self, exec: NewExecution) -> Result<u64> {
        if exec.thread_id.is_empty() {
            return Err(EngineError::validation("thread_id", "must be non-empty"));
        }
        if exec.tool_name.is_empty() {
            return Err(EngineError::validation("tool_name", "must be non-empty"));
        }
        let arguments = snapshot_map(&exec.arguments)?;
        let result = exec.result.as_ref().map(snapshot_value).transpose()?;
        let digest = execution_digest(&exec.tool_name, &arguments);

        let shared = self.state_or_create(&exec.thread_id);
        let mut state = shared.lock();
        let sequence = state.sequencer.next();
        let replaced = state.cache.insert(ToolExecutionRecord {
            sequence,
            tool_name: exec.tool_name,
            arguments,
            arguments_digest: digest.clone(),
            timestamp: Utc::now(),
            result,
            error: exec.error,
            skipped: exec.skipped,
        });
        if state.cache.len() > self.config.cache.max_executions_per_thread {
            let _ = state.cache.evict(Utc::now(), &self.config.cache);
        }
        debug!(sequence, digest = %digest, replaced, "tool execution recorded");
        Ok(sequence)
    }

    /// Store one metadata entry for a thread.
    ///
    /// `channel` and `channel_type` string values land in named fields;
    /// everything else goes into the open map. A null value clears the
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `thread_id` or `key` is empty, and a
    /// serialization error when the value nests too deeply.
    #[instrument(skip(self, value), fields(thread_id = %thread_id, key = %key))]
    pub fn set_metadata(&self, thread_id: &ThreadId, key: &str, value: Value) -> Result<()> {
        if thread_id.is_empty() {
            return Err(EngineError::validation("thread_id", "must be non-empty"));
        }
        if key.is_empty() {
            return Err(EngineError::validation("key", "must be non-empty"));
        }
        let value = snapshot_value(&value)?;
        let shared = self.state_or_create(thread_id);
        let mut state = shared.lock();
        state.meta.set(key, value);
        Ok(())
    }

    /// Record the state of an interactive button.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `thread_id` or `action_id` is empty,
    /// and a serialization error when the metadata nests too deeply.
    #[instrument(
        skip(self, metadata),
        fields(thread_id = %thread_id, action_id = %action_id)
    )]
    pub fn set_button_state(
        &self,
        thread_id: &ThreadId,
        action_id: &ActionId,
        button: ButtonState,
        metadata: Map<String, Value>,
    ) -> Result<()> {
        if thread_id.is_empty() {
            return Err(EngineError::validation("thread_id", "must be non-empty"));
        }
        if action_id.is_empty() {
            return Err(EngineError::validation("action_id", "must be non-empty"));
        }
        let metadata = snapshot_map(&metadata)?;
        let shared = self.state_or_create(thread_id);
        let mut state = shared.lock();
        let _ = state.buttons.insert(
            action_id.clone(),
            ButtonStateEntry {
                state: button,
                metadata,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    // ─── outbound ───────────────────────────────────────────────────────────

    /// Whether a deep-equal invocation of `tool_name` was already recorded.
    #[must_use]
    pub fn has_executed(
        &self,
        thread_id: &ThreadId,
        tool_name: &str,
        arguments: &Map<String, Value>,
    ) -> bool {
        let Some(shared) = self.state(thread_id) else {
            return false;
        };
        let digest = execution_digest(tool_name, arguments);
        let state = shared.lock();
        state.cache.has_digest(&digest)
    }

    /// The cached result of a deep-equal invocation, as a snapshot copy.
    #[must_use]
    pub fn get_tool_result(
        &self,
        thread_id: &ThreadId,
        tool_name: &str,
        arguments: &Map<String, Value>,
    ) -> Option<Value> {
        let shared = self.state(thread_id)?;
        let digest = execution_digest(tool_name, arguments);
        let state = shared.lock();
        let value = state.cache.result_for(&digest)?;
        snapshot_value(value).ok()
    }

    /// Active messages of a thread, in order. Empty for unknown threads.
    #[must_use]
    pub fn get_thread_messages(&self, thread_id: &ThreadId) -> Vec<ContextMessage> {
        self.state(thread_id)
            .map_or_else(Vec::new, |shared| shared.lock().log.active_messages())
    }

    /// Per-source message counts for a thread.
    #[must_use]
    pub fn get_thread_summary(&self, thread_id: &ThreadId) -> ThreadSummary {
        self.state(thread_id)
            .map_or_else(ThreadSummary::default, |shared| shared.lock().log.summary())
    }

    /// One metadata entry for a thread.
    #[must_use]
    pub fn get_metadata(&self, thread_id: &ThreadId, key: &str) -> Option<Value> {
        let shared = self.state(thread_id)?;
        let state = shared.lock();
        state.meta.get(key)
    }

    /// The recorded state of an interactive button.
    #[must_use]
    pub fn get_button_state(
        &self,
        thread_id: &ThreadId,
        action_id: &ActionId,
    ) -> Option<ButtonStateEntry> {
        let shared = self.state(thread_id)?;
        let state = shared.lock();
        state.buttons.get(action_id).cloned()
    }

    /// Prune a thread's history down to the configured target.
    ///
    /// Returns the number of messages removed from the active view. When
    /// anything was removed, a system notice is appended through the normal
    /// add path (as a `SystemNote`, so later prunes keep it).
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub fn prune_thread_history(&self, thread_id: &ThreadId) -> usize {
        let Some(shared) = self.state(thread_id) else {
            return 0;
        };
        let mut state = shared.lock();
        Self::prune_locked(&mut state, thread_id, &self.config)
    }

    /// Evict expired and surplus tool executions for a thread.
    ///
    /// Returns the number of records dropped; zero for unknown threads.
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub fn evict_executions(&self, thread_id: &ThreadId) -> usize {
        let Some(shared) = self.state(thread_id) else {
            return 0;
        };
        let mut state = shared.lock();
        state.cache.evict(Utc::now(), &self.config.cache)
    }

    /// Serialize a thread's surviving history for the LLM caller.
    ///
    /// Prunes first when the active history exceeds the configured maximum,
    /// so the serialized context and the stored history agree. Never fails:
    /// unknown or empty threads yield a single explanatory entry.
    #[instrument(skip(self, options), fields(thread_id = %thread_id))]
    pub fn build_context(
        &self,
        thread_id: &ThreadId,
        options: &BuildOptions,
    ) -> Vec<ContextEntry> {
        let Some(shared) = self.state(thread_id) else {
            return formatter::build_entries(&ThreadState::new(), options, &self.config.format);
        };
        let mut state = shared.lock();
        if state.log.active_len() > self.config.prune.max_messages {
            let _ = Self::prune_locked(&mut state, thread_id, &self.config);
        }
        formatter::build_entries(&state, options, &self.config.format)
    }

    // ─── internals ──────────────────────────────────────────────────────────

    /// Look up a thread's state without creating it.
    fn state(&self, thread_id: &ThreadId) -> Option<Arc<Mutex<ThreadState>>> {
        self.threads
            .get(thread_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a thread's state, creating it on first use.
    fn state_or_create(&self, thread_id: &ThreadId) -> Arc<Mutex<ThreadState>> {
        Arc::clone(self.threads.entry(thread_id.clone()).or_default().value())
    }

    /// Insert a message into an already-locked thread state.
    ///
    /// Shared by `add_message` and the pruning notice so the notice does not
    /// re-enter the thread's lock.
    fn insert_message(state: &mut ThreadState, new: NewMessage) -> MessageId {
        let id = new.id.unwrap_or_default();
        if state.log.contains(&id) {
            debug!(message_id = %id, "duplicate message insert ignored");
            return id;
        }
        let sequence = match (new.tool_sequence, new.source) {
            (Some(seq), source) if source != MessageSource::User => seq,
            _ => state.sequencer.next(),
        };
        let _ = state.log.insert(ContextMessage {
            id: id.clone(),
            thread_id: new.thread_id,
            timestamp: new.timestamp.unwrap_or_else(Utc::now),
            sequence,
            source: new.source,
            source_id: new.source_id,
            text: new.text,
            kind: new.kind,
            metadata: new.metadata,
        });
        debug!(message_id = %id, sequence, "message recorded");
        id
    }

    /// Prune an already-locked thread and append the removal notice.
    fn prune_locked(state: &mut ThreadState, thread_id: &ThreadId, config: &EngineConfig) -> usize {
        let removed = pruner::prune(&mut state.log, &config.prune);
        if removed > 0 {
            let text = PRUNE_NOTICE_TEMPLATE.replace("{count}", &removed.to_string());
            let notice =
                NewMessage::system(thread_id.clone(), text).with_kind(MessageKind::SystemNote);
            let _ = Self::insert_message(state, notice);
        }
        removed
    }
}

impl Default for ContextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextEngine")
            .field("threads", &self.threads.len())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thread() -> ThreadId {
        ThreadId::from("thr-1")
    }

    // -- validation --

    #[test]
    fn empty_thread_id_is_rejected() {
        let engine = ContextEngine::new();
        let err = engine
            .add_message(NewMessage::user("", "hello"))
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(engine.thread_count(), 0);
    }

    #[test]
    fn empty_tool_name_is_rejected() {
        let engine = ContextEngine::new();
        let err = engine
            .record_tool_execution(NewExecution::new("thr-1", ""))
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(engine.thread_count(), 0);
    }

    #[test]
    fn rejected_execution_burns_no_sequence() {
        let engine = ContextEngine::new();
        let deep = {
            let mut value = json!("leaf");
            for _ in 0..70 {
                value = json!([value]);
            }
            value
        };
        let exec = NewExecution::new("thr-1", "search").with_result(deep);
        assert!(engine.record_tool_execution(exec).is_err());

        // Next sequence on the thread is still 0
        let seq = engine
            .record_tool_execution(NewExecution::new("thr-1", "search"))
            .unwrap();
        assert_eq!(seq, 0);
    }

    // -- sequencing --

    #[test]
    fn messages_and_executions_share_one_order() {
        let engine = ContextEngine::new();
        let _ = engine.add_message(NewMessage::user(thread(), "one")).unwrap();
        let seq = engine
            .record_tool_execution(NewExecution::new(thread(), "search"))
            .unwrap();
        assert_eq!(seq, 1);

        let _ = engine.add_message(NewMessage::user(thread(), "two")).unwrap();
        let messages = engine.get_thread_messages(&thread());
        assert_eq!(messages[1].sequence, 2);
    }

    #[test]
    fn tool_tagged_message_inherits_the_execution_sequence() {
        let engine = ContextEngine::new();
        let seq = engine
            .record_tool_execution(NewExecution::new(thread(), "post_message"))
            .unwrap();
        let id = engine
            .add_message(
                NewMessage::new(thread(), MessageSource::Tool)
                    .with_text("posted")
                    .from_tool(seq),
            )
            .unwrap();

        let messages = engine.get_thread_messages(&thread());
        assert_eq!(messages[0].id, id);
        assert_eq!(messages[0].sequence, seq);
    }

    #[test]
    fn user_message_never_inherits_a_tool_sequence() {
        let engine = ContextEngine::new();
        let _ = engine
            .record_tool_execution(NewExecution::new(thread(), "search"))
            .unwrap();
        let _ = engine
            .add_message(NewMessage::user(thread(), "hi").from_tool(0))
            .unwrap();

        let messages = engine.get_thread_messages(&thread());
        assert_eq!(messages[0].sequence, 1);
    }

    #[test]
    fn duplicate_message_id_returns_existing() {
        let engine = ContextEngine::new();
        let first = engine
            .add_message(NewMessage::user(thread(), "hello").with_id("m-1"))
            .unwrap();
        let second = engine
            .add_message(NewMessage::user(thread(), "replayed").with_id("m-1"))
            .unwrap();

        assert_eq!(first, second);
        let messages = engine.get_thread_messages(&thread());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "hello");
        // The replay drew no sequence
        let _ = engine.add_message(NewMessage::user(thread(), "next")).unwrap();
        assert_eq!(engine.get_thread_messages(&thread())[1].sequence, 1);
    }

    // -- state creation --

    #[test]
    fn reads_never_create_thread_state() {
        let engine = ContextEngine::new();
        let unknown = ThreadId::from("ghost");

        assert!(engine.get_thread_messages(&unknown).is_empty());
        assert!(engine.get_thread_summary(&unknown).is_empty);
        assert!(!engine.has_executed(&unknown, "search", &Map::new()));
        assert!(engine.get_tool_result(&unknown, "search", &Map::new()).is_none());
        assert!(engine.get_metadata(&unknown, "channel").is_none());
        assert_eq!(engine.prune_thread_history(&unknown), 0);
        assert_eq!(engine.evict_executions(&unknown), 0);
        let _ = engine.build_context(&unknown, &BuildOptions::default());

        assert_eq!(engine.thread_count(), 0);
    }

    #[test]
    fn writes_create_thread_state_lazily() {
        let engine = ContextEngine::new();
        assert_eq!(engine.thread_count(), 0);
        let _ = engine.add_message(NewMessage::user("a", "hi")).unwrap();
        let _ = engine.add_message(NewMessage::user("b", "hi")).unwrap();
        let _ = engine.add_message(NewMessage::user("a", "again")).unwrap();
        assert_eq!(engine.thread_count(), 2);
    }

    // -- metadata and buttons --

    #[test]
    fn metadata_round_trips_through_the_engine() {
        let engine = ContextEngine::new();
        engine
            .set_metadata(&thread(), "channel_type", json!("im"))
            .unwrap();
        engine.set_metadata(&thread(), "locale", json!("en-US")).unwrap();

        assert_eq!(
            engine.get_metadata(&thread(), "channel_type"),
            Some(json!("im"))
        );
        assert_eq!(engine.get_metadata(&thread(), "locale"), Some(json!("en-US")));
        assert!(engine.get_metadata(&thread(), "missing").is_none());
    }

    #[test]
    fn button_state_round_trips_and_overwrites() {
        let engine = ContextEngine::new();
        let action = ActionId::from("act-1");
        engine
            .set_button_state(&thread(), &action, ButtonState::Active, Map::new())
            .unwrap();
        engine
            .set_button_state(&thread(), &action, ButtonState::Selected, Map::new())
            .unwrap();

        let entry = engine.get_button_state(&thread(), &action).unwrap();
        assert_eq!(entry.state, ButtonState::Selected);
        assert!(engine
            .get_button_state(&thread(), &ActionId::from("other"))
            .is_none());
    }

    #[test]
    fn empty_action_id_is_rejected() {
        let engine = ContextEngine::new();
        let err = engine
            .set_button_state(&thread(), &ActionId::from(""), ButtonState::Active, Map::new())
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
