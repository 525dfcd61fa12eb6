//! # braid-context
//!
//! Thread-scoped context engine: ordering, tool-execution caching, history
//! pruning, and context serialization for a chat assistant.
//!
//! - **Engine**: [`ContextEngine`] facade — one instance serves every live
//!   thread; `DashMap` locates a thread, a per-thread mutex makes each
//!   operation atomic
//! - **Message log**: canonical record map + ordered active view; replayed
//!   deliveries and pruned IDs are detected as duplicates
//! - **Execution cache**: digest-deduplicated tool outcomes with age and
//!   size eviction (allowlisted tools exempt from age expiry)
//! - **Pruner**: shrinks overlong histories, keeping the root message,
//!   always-keep kinds, and the most recent messages
//! - **Formatter**: serializes surviving history into ordered
//!   [`ContextEntry`] values (stats, persona, merged timeline)
//! - **Metadata**: per-thread channel info and interactive-button state
//!
//! # Usage
//!
//! ```no_run
//! use braid_context::{BuildOptions, ContextEngine};
//! use braid_core::NewMessage;
//!
//! let engine = ContextEngine::new();
//! let thread = braid_core::ThreadId::from("C123:1700000000.000100");
//! let _id = engine.add_message(NewMessage::user(thread.clone(), "hello"))?;
//! let entries = engine.build_context(&thread, &BuildOptions::default());
//! # Ok::<(), braid_core::EngineError>(())
//! ```

#![deny(unsafe_code)]

pub mod constants;
pub mod digest;
pub mod engine;
pub mod execution_cache;
pub mod formatter;
pub mod message_log;
pub mod metadata;
pub mod pruner;
pub mod sequencer;
pub mod snapshot;
pub mod thread_state;
pub mod types;

pub use digest::execution_digest;
pub use engine::ContextEngine;
pub use metadata::{ButtonState, ButtonStateEntry, ThreadMeta};
pub use snapshot::{snapshot_map, snapshot_value};
pub use types::{
    BuildOptions, CacheConfig, ContextEntry, EngineConfig, EntryContent, EntryRole, FormatConfig,
    NewExecution, PruneConfig, ThreadSummary,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        // Verify that key types are accessible through the crate root
        let engine = ContextEngine::new();
        assert_eq!(engine.thread_count(), 0);
        let _options = BuildOptions::default();
        let _config = EngineConfig::default();
    }

    #[test]
    fn digest_re_exported() {
        let digest = execution_digest("search", &serde_json::Map::new());
        assert_eq!(digest.len(), 32);
    }
}
