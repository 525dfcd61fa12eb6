//! Aggregate state for a single conversation thread.

use std::collections::HashMap;

use braid_core::ActionId;

use crate::execution_cache::ExecutionCache;
use crate::message_log::MessageLog;
use crate::metadata::{ButtonStateEntry, ThreadMeta};
use crate::sequencer::Sequencer;

/// Everything the engine tracks for one thread.
///
/// A `ThreadState` lives behind a mutex in the engine's thread map, so all
/// fields are plain owned data with no interior locking of their own.
#[derive(Debug, Default)]
pub struct ThreadState {
    /// Sequenced conversation messages.
    pub log: MessageLog,
    /// Recorded tool executions.
    pub cache: ExecutionCache,
    /// Source of per-thread sequence numbers.
    pub sequencer: Sequencer,
    /// Channel info and free-form metadata.
    pub meta: ThreadMeta,
    /// Interactive-button states keyed by action id.
    pub buttons: HashMap<ActionId, ButtonStateEntry>,
}

impl ThreadState {
    /// Create a fresh, empty thread state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
