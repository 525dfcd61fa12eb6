//! Per-thread message storage.
//!
//! [`MessageLog`] keeps two views of a thread's messages: the canonical
//! record map, which holds every message ever inserted, and the ordered
//! active list, which is what pruning trims and context building reads.
//! Pruning a message removes it from the active view only — its record and
//! its sequence are permanent.

use std::collections::{HashMap, HashSet};

use braid_core::{ContextMessage, MessageId, MessageSource};

use crate::types::ThreadSummary;

/// Canonical message records plus the ordered active view.
#[derive(Debug, Default)]
pub struct MessageLog {
    records: HashMap<MessageId, ContextMessage>,
    active: Vec<MessageId>,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message with this ID has ever been inserted.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.records.contains_key(id)
    }

    /// Insert a message, appending it to the active view.
    ///
    /// Returns `false` without touching anything if the ID is already
    /// present — an insert is never an update.
    pub fn insert(&mut self, message: ContextMessage) -> bool {
        if self.records.contains_key(&message.id) {
            return false;
        }
        self.active.push(message.id.clone());
        let _ = self.records.insert(message.id.clone(), message);
        true
    }

    /// Fetch a message record by ID, active or not.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&ContextMessage> {
        self.records.get(id)
    }

    /// Number of messages in the active view.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of canonical records, including pruned ones.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the active view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterate the active view in insertion order.
    pub fn iter_active(&self) -> impl Iterator<Item = &ContextMessage> {
        self.active.iter().filter_map(|id| self.records.get(id))
    }

    /// The oldest active message.
    #[must_use]
    pub fn first_active(&self) -> Option<&ContextMessage> {
        self.active.first().and_then(|id| self.records.get(id))
    }

    /// Clones of the active view in insertion order.
    #[must_use]
    pub fn active_messages(&self) -> Vec<ContextMessage> {
        self.iter_active().cloned().collect()
    }

    /// Drop every active ID not in `keep`, preserving relative order.
    ///
    /// Canonical records are untouched. Returns the number of IDs removed
    /// from the active view.
    pub fn retain_active(&mut self, keep: &HashSet<MessageId>) -> usize {
        let before = self.active.len();
        self.active.retain(|id| keep.contains(id));
        before - self.active.len()
    }

    /// Per-source counts over the active view.
    #[must_use]
    pub fn summary(&self) -> ThreadSummary {
        let mut summary = ThreadSummary {
            total_messages: self.active.len(),
            is_empty: self.active.is_empty(),
            ..ThreadSummary::default()
        };
        for message in self.iter_active() {
            match message.source {
                MessageSource::User => summary.user_messages += 1,
                MessageSource::Assistant => summary.assistant_messages += 1,
                MessageSource::System => summary.system_messages += 1,
                MessageSource::Tool => summary.tool_messages += 1,
            }
        }
        summary
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
