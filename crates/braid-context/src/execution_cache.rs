//! Per-thread tool execution cache.
//!
//! [`ExecutionCache`] holds one thread's recorded tool invocations in
//! chronological order, with a digest index for O(1) "have we already run
//! this?" lookups. The cache maintains one record per digest: a retried
//! execution replaces its predecessor and moves to the tail, so the index
//! always points at the newest outcome.
//!
//! Eviction runs in two phases — expire by age (allowlisted tools exempt),
//! then enforce the size cap newest-first with allowlisted records kept
//! ahead of the rest — and rebuilds the index from the survivors.

use std::collections::HashMap;

use braid_core::ToolExecutionRecord;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::types::CacheConfig;

/// Chronological execution records plus a digest index.
#[derive(Debug, Default)]
pub struct ExecutionCache {
    records: Vec<ToolExecutionRecord>,
    index: HashMap<String, usize>,
}

impl ExecutionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records in chronological order.
    #[must_use]
    pub fn records(&self) -> &[ToolExecutionRecord] {
        &self.records
    }

    /// Insert a record, replacing any existing record with the same digest.
    ///
    /// The new record lands at the chronological tail either way. Returns
    /// `true` when a predecessor was replaced.
    pub fn insert(&mut self, record: ToolExecutionRecord) -> bool {
        let digest = record.arguments_digest.clone();
        let replaced = if let Some(&position) = self.index.get(&digest) {
            let _ = self.records.remove(position);
            true
        } else {
            false
        };
        self.records.push(record);
        if replaced {
            self.rebuild_index();
        } else {
            let _ = self.index.insert(digest, self.records.len() - 1);
        }
        replaced
    }

    /// Whether an execution with this digest is cached.
    #[must_use]
    pub fn has_digest(&self, digest: &str) -> bool {
        self.index.contains_key(digest)
    }

    /// The cached record for a digest.
    #[must_use]
    pub fn record_for(&self, digest: &str) -> Option<&ToolExecutionRecord> {
        self.index
            .get(digest)
            .and_then(|&position| self.records.get(position))
    }

    /// The cached result payload for a digest.
    #[must_use]
    pub fn result_for(&self, digest: &str) -> Option<&Value> {
        self.record_for(digest).and_then(|r| r.result.as_ref())
    }

    /// Evict expired and surplus records; returns how many were dropped.
    ///
    /// Phase 1 drops records strictly older than `max_age_ms` unless their
    /// tool is allowlisted. Phase 2 enforces `max_executions_per_thread`,
    /// walking newest-first and keeping allowlisted records ahead of the
    /// rest; if the allowlisted records alone exceed the cap, the most
    /// recent of them win. Idempotent.
    pub fn evict(&mut self, now: DateTime<Utc>, config: &CacheConfig) -> usize {
        let before = self.records.len();

        let max_age =
            Duration::milliseconds(i64::try_from(config.max_age_ms).unwrap_or(i64::MAX));
        self.records.retain(|record| {
            config.is_never_expire(&record.tool_name)
                || now.signed_duration_since(record.timestamp) <= max_age
        });

        let max = config.max_executions_per_thread;
        if self.records.len() > max {
            let protected = self
                .records
                .iter()
                .filter(|r| config.is_never_expire(&r.tool_name))
                .count();
            let (allow_cap, spare) = if protected >= max {
                (max, 0)
            } else {
                (protected, max - protected)
            };

            let mut keep = vec![false; self.records.len()];
            let mut allow_kept = 0usize;
            let mut spare_used = 0usize;
            for i in (0..self.records.len()).rev() {
                if config.is_never_expire(&self.records[i].tool_name) {
                    if allow_kept < allow_cap {
                        keep[i] = true;
                        allow_kept += 1;
                    }
                } else if spare_used < spare {
                    keep[i] = true;
                    spare_used += 1;
                }
            }

            let mut position = 0;
            self.records.retain(|_| {
                let kept = keep[position];
                position += 1;
                kept
            });
        }

        self.rebuild_index();
        before - self.records.len()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, record) in self.records.iter().enumerate() {
            let _ = self
                .index
                .insert(record.arguments_digest.clone(), position);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
