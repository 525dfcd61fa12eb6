//! Context serialization.
//!
//! [`build_entries`] turns one thread's state into the ordered, structured
//! context handed to the LLM caller: a stats entry, a persona entry, then
//! the merged message/tool timeline with turn numbers. The formatter is
//! pure — pruning has already happened by the time the engine calls it —
//! and it never fails as a whole: an entry that cannot be rendered is
//! logged and skipped, and an empty timeline is replaced by a single
//! explanatory note so the caller never receives an empty context.

use braid_core::{ContextMessage, MessageSource, Result, ToolExecutionRecord};
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::constants::{EMPTY_CONTEXT_NOTE, PERSONA_FALLBACK_USER, STRIPPED_ARG_KEYS};
use crate::snapshot::{snapshot_map, snapshot_value};
use crate::thread_state::ThreadState;
use crate::types::{BuildOptions, ContextEntry, EntryContent, EntryRole, FormatConfig};

/// One slot in the merged timeline before rendering.
enum TimelineItem<'a> {
    Message(&'a ContextMessage),
    Tool(&'a ToolExecutionRecord),
}

impl TimelineItem<'_> {
    /// Merge order: sequence, then timestamp, tool before message on an
    /// exact tie (the derived message narrates the execution's outcome).
    fn sort_key(&self) -> (u64, DateTime<Utc>, u8) {
        match self {
            Self::Tool(record) => (record.sequence, record.timestamp, 0),
            Self::Message(message) => (message.sequence, message.timestamp, 1),
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Tool(record) => record.timestamp,
            Self::Message(message) => message.timestamp,
        }
    }
}

/// Serialize a thread's surviving history into ordered context entries.
pub fn build_entries(
    state: &ThreadState,
    options: &BuildOptions,
    config: &FormatConfig,
) -> Vec<ContextEntry> {
    let all_active: Vec<&ContextMessage> = state.log.iter_active().collect();

    // Window the messages (most recent `limit`), then apply filters.
    let mut window = all_active.clone();
    if let Some(limit) = options.limit {
        let skip = window.len().saturating_sub(limit);
        window = window.split_off(skip);
    }
    if !options.include_bot_messages {
        window.retain(|m| !m.source.is_bot());
    }

    let mut timeline: Vec<TimelineItem> =
        window.iter().copied().map(TimelineItem::Message).collect();
    if options.include_tool_calls {
        timeline.extend(state.cache.records().iter().map(TimelineItem::Tool));
    }
    timeline.sort_by_key(TimelineItem::sort_key);

    if timeline.is_empty() {
        return vec![ContextEntry {
            index: 0,
            turn: 0,
            timestamp: Utc::now(),
            role: EntryRole::System,
            content: EntryContent::Note {
                text: EMPTY_CONTEXT_NOTE.to_string(),
            },
        }];
    }

    // Lead entries borrow the first timeline timestamp so the whole context
    // stays non-decreasing in time.
    let lead_ts = timeline[0].timestamp();
    let summary = state.log.summary();
    let mut entries = Vec::with_capacity(timeline.len() + 2);
    entries.push(ContextEntry {
        index: 0,
        turn: 0,
        timestamp: lead_ts,
        role: EntryRole::System,
        content: EntryContent::Stats {
            total_messages: summary.total_messages,
            user_messages: summary.user_messages,
            assistant_messages: summary.assistant_messages,
            tool_calls: state.cache.len(),
            is_direct: state.meta.is_direct(),
            is_first_contact: summary.total_messages <= 1,
        },
    });
    entries.push(ContextEntry {
        index: 1,
        turn: 0,
        timestamp: lead_ts,
        role: EntryRole::System,
        content: EntryContent::Persona {
            text: render_persona(&all_active, config),
        },
    });

    let gap = Duration::milliseconds(i64::try_from(config.turn_gap_ms).unwrap_or(i64::MAX));
    let mut index = 2usize;
    let mut turn = 1usize;
    let mut prev_was_bot = false;
    let mut last_user_ts: Option<DateTime<Utc>> = None;

    for item in &timeline {
        let (role, ts, is_user, is_bot) = match item {
            TimelineItem::Message(message) => {
                let role = match message.source {
                    MessageSource::User => EntryRole::User,
                    MessageSource::System => EntryRole::System,
                    MessageSource::Assistant | MessageSource::Tool => EntryRole::Assistant,
                };
                (
                    role,
                    message.timestamp,
                    message.source == MessageSource::User,
                    message.source.is_bot(),
                )
            }
            TimelineItem::Tool(record) => (EntryRole::Assistant, record.timestamp, false, true),
        };

        // A user message starts a new turn when it answers assistant/tool
        // activity and is not a rapid follow-up to the previous user message.
        if is_user {
            if prev_was_bot
                && last_user_ts.is_none_or(|prev| ts.signed_duration_since(prev) > gap)
            {
                turn += 1;
            }
            last_user_ts = Some(ts);
        }
        prev_was_bot = is_bot;

        let content = match item {
            TimelineItem::Message(message) => render_message(message, state),
            TimelineItem::Tool(record) => match render_tool(record) {
                Ok(content) => content,
                Err(err) => {
                    warn!(
                        tool = %record.tool_name,
                        sequence = record.sequence,
                        error = %err,
                        "skipping unrenderable tool entry"
                    );
                    continue;
                }
            },
        };

        entries.push(ContextEntry {
            index,
            turn,
            timestamp: ts,
            role,
            content,
        });
        index += 1;
    }

    entries
}

/// Render the persona preamble, addressing the most recent human
/// correspondent on the thread.
fn render_persona(active: &[&ContextMessage], config: &FormatConfig) -> String {
    let actor = active
        .iter()
        .rev()
        .find(|m| !m.source.is_bot() && m.source_id.is_some())
        .and_then(|m| m.source_id.clone())
        .unwrap_or_else(|| PERSONA_FALLBACK_USER.to_string());
    config.persona_template.replace("{user}", &actor)
}

fn render_message(message: &ContextMessage, state: &ThreadState) -> EntryContent {
    let channel = message
        .meta_str("channel")
        .map(ToString::to_string)
        .or_else(|| state.meta.channel.clone());
    EntryContent::Message {
        text: message.text.clone(),
        message_id: message.id.clone(),
        ts: message.meta_str("ts").map(ToString::to_string),
        channel,
    }
}

fn render_tool(record: &ToolExecutionRecord) -> Result<EntryContent> {
    let mut arguments = snapshot_map(&record.arguments)?;
    for key in STRIPPED_ARG_KEYS {
        let _ = arguments.remove(*key);
    }
    let result = record.result.as_ref().map(snapshot_value).transpose()?;
    Ok(EntryContent::ToolCall {
        tool_name: record.tool_name.clone(),
        status: record.status(),
        arguments,
        result,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
