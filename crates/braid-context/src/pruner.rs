//! History pruning.
//!
//! When a thread's active history grows past the configured ceiling, the
//! pruner shrinks it back to the target size. The keep-set is built from
//! three sources: the thread's first active message (the root, usually the
//! message that started the conversation), every message whose kind is
//! marked always-keep, and then the most recent messages until the target
//! is reached. Pruned messages leave the active view but stay in the
//! canonical record, so a delivery replay of a pruned id is still detected
//! as a duplicate.

use std::collections::HashSet;

use braid_core::{ContextMessage, MessageId};
use tracing::debug;

use crate::message_log::MessageLog;
use crate::types::PruneConfig;

/// Shrink the active history to the configured target.
///
/// Returns the number of messages removed from the active view. No-op when
/// the history is at or below `max_messages`, or too small to prune at all
/// (`min_messages_to_keep`).
pub fn prune(log: &mut MessageLog, config: &PruneConfig) -> usize {
    let active = log.active_len();
    if active <= config.min_messages_to_keep || active <= config.max_messages {
        return 0;
    }

    let mut keep: HashSet<MessageId> = HashSet::new();
    if config.keep_root {
        if let Some(root) = log.first_active() {
            let _ = keep.insert(root.id.clone());
        }
    }
    for message in log.iter_active() {
        if config.always_keep_kinds.contains(&message.kind) {
            let _ = keep.insert(message.id.clone());
        }
    }

    // Fill the remaining budget newest-first. Already-kept ids re-inserted
    // here do not grow the set, so the target bounds the total.
    let recent: Vec<&ContextMessage> = log.iter_active().collect();
    for message in recent.iter().rev() {
        if keep.len() >= config.target_messages {
            break;
        }
        let _ = keep.insert(message.id.clone());
    }

    let removed = log.retain_active(&keep);
    debug!(removed, remaining = log.active_len(), "pruned thread history");
    removed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use braid_core::{MessageKind, MessageSource};
    use chrono::Utc;
    use serde_json::Map;

    fn message(id: &str, sequence: u64, kind: MessageKind) -> ContextMessage {
        ContextMessage {
            id: MessageId::from(id),
            thread_id: "thr-1".into(),
            timestamp: Utc::now(),
            sequence,
            source: MessageSource::User,
            source_id: None,
            text: format!("message {id}"),
            kind,
            metadata: Map::new(),
        }
    }

    fn filled_log(count: usize) -> MessageLog {
        let mut log = MessageLog::new();
        for i in 0..count {
            let _ = log.insert(message(&format!("m{i}"), i as u64, MessageKind::Text));
        }
        log
    }

    fn active_ids(log: &MessageLog) -> Vec<String> {
        log.iter_active().map(|m| m.id.to_string()).collect()
    }

    // -- no-op guards --

    #[test]
    fn at_or_below_max_is_untouched() {
        let mut log = filled_log(75);
        assert_eq!(prune(&mut log, &PruneConfig::default()), 0);
        assert_eq!(log.active_len(), 75);
    }

    #[test]
    fn tiny_history_is_never_pruned() {
        // Even with an absurdly low ceiling, the minimum wins
        let mut log = filled_log(5);
        let config = PruneConfig {
            max_messages: 3,
            target_messages: 2,
            ..PruneConfig::default()
        };
        assert_eq!(prune(&mut log, &config), 0);
        assert_eq!(log.active_len(), 5);
    }

    // -- keep-set shape --

    #[test]
    fn over_max_shrinks_to_target_keeping_root_and_recent() {
        let mut log = filled_log(76);
        let removed = prune(&mut log, &PruneConfig::default());

        assert_eq!(removed, 26);
        assert_eq!(log.active_len(), 50);
        let ids = active_ids(&log);
        assert_eq!(ids[0], "m0");
        assert_eq!(ids[1], "m27");
        assert_eq!(ids.last().unwrap(), "m75");
    }

    #[test]
    fn always_keep_kinds_survive_from_the_old_region() {
        let mut log = MessageLog::new();
        for i in 0..80usize {
            let kind = if i == 5 {
                MessageKind::ButtonClick
            } else {
                MessageKind::Text
            };
            let _ = log.insert(message(&format!("m{i}"), i as u64, kind));
        }

        let removed = prune(&mut log, &PruneConfig::default());
        assert_eq!(removed, 30);
        assert_eq!(log.active_len(), 50);
        let ids = active_ids(&log);
        assert_eq!(ids[0], "m0");
        assert_eq!(ids[1], "m5");
        assert_eq!(ids[2], "m32");
    }

    #[test]
    fn keep_root_false_drops_the_first_message() {
        let mut log = filled_log(76);
        let config = PruneConfig {
            keep_root: false,
            ..PruneConfig::default()
        };
        let removed = prune(&mut log, &config);

        assert_eq!(removed, 26);
        assert_eq!(active_ids(&log)[0], "m26");
    }

    #[test]
    fn pruned_messages_stay_in_the_canonical_record() {
        let mut log = filled_log(76);
        let _ = prune(&mut log, &PruneConfig::default());

        assert_eq!(log.total_len(), 76);
        assert!(log.contains(&MessageId::from("m10")));
        assert!(!log.insert(message("m10", 999, MessageKind::Text)));
        assert_eq!(log.active_len(), 50);
    }

    #[test]
    fn prune_is_idempotent_once_under_max() {
        let mut log = filled_log(120);
        let first = prune(&mut log, &PruneConfig::default());
        let second = prune(&mut log, &PruneConfig::default());

        assert_eq!(first, 70);
        assert_eq!(second, 0);
        assert_eq!(log.active_len(), 50);
    }
}
