//! Test support for asserting on log output.
//!
//! [`capture_logs`] installs a thread-local subscriber that records every
//! event and span in memory, so a test can check that an operation logged
//! what it should. The capture is scoped to the returned guard and never
//! touches the global subscriber, which keeps parallel tests isolated.

use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// One recorded log event.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Module path that emitted the event.
    pub target: String,
    /// Rendered message.
    pub message: String,
    /// Structured fields as key/value strings.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Look up a structured field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Shared handle to everything recorded since [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<String>>>,
}

impl CapturedLogs {
    /// Snapshot of all recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Whether an event at `level` with a message containing `needle` was
    /// recorded.
    #[must_use]
    pub fn has_event(&self, level: Level, needle: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .iter()
            .any(|event| event.level == level && event.message.contains(needle))
    }

    /// Whether a span with this name was created.
    #[must_use]
    pub fn has_span(&self, name: &str) -> bool {
        self.spans.lock().unwrap().iter().any(|span| span == name)
    }
}

/// Layer feeding events and span names into a [`CapturedLogs`] handle.
struct CaptureLayer {
    logs: CapturedLogs,
}

/// Visitor splitting an event into its message and remaining fields.
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for EventVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_owned(), rendered));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.push((field.name().to_owned(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.push((field.name().to_owned(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.push((field.name().to_owned(), value.to_string()));
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.logs.events.lock().unwrap().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }

    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: Context<'_, S>,
    ) {
        self.logs
            .spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_owned());
    }
}

/// Install a capturing subscriber on the current thread.
///
/// Returns the captured-logs handle and a guard; capture stays active until
/// the guard is dropped. The subscriber is thread-local (`set_default`), so
/// parallel tests do not see each other's events.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let layer = CaptureLayer { logs: logs.clone() };

    let subscriber = tracing_subscriber::registry()
        .with(layer)
        .with(LevelFilter::TRACE);

    let guard = subscriber.set_default();
    (logs, guard)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- events --

    #[test]
    fn captures_events_with_level_and_message() {
        let (logs, _guard) = capture_logs();
        tracing::debug!("history trimmed");
        tracing::warn!("snapshot failed");

        assert!(logs.has_event(Level::DEBUG, "history trimmed"));
        assert!(logs.has_event(Level::WARN, "snapshot failed"));
        assert!(!logs.has_event(Level::ERROR, "history trimmed"));
    }

    #[test]
    fn captures_structured_fields() {
        let (logs, _guard) = capture_logs();
        tracing::debug!(removed = 26_usize, thread = "thr-1", "history pruned");

        let events = logs.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].field("removed"), Some("26"));
        assert_eq!(events[0].field("thread"), Some("thr-1"));
        assert_eq!(events[0].field("missing"), None);
    }

    #[test]
    fn captures_display_formatted_fields() {
        let (logs, _guard) = capture_logs();
        let digest = "a1b2c3";
        tracing::debug!(digest = %digest, "execution recorded");

        assert_eq!(logs.events()[0].field("digest"), Some("a1b2c3"));
    }

    #[test]
    fn target_names_the_emitting_module() {
        let (logs, _guard) = capture_logs();
        tracing::debug!(target: "braid_context::pruner", "pruned thread history");

        assert!(logs.events()[0].target.starts_with("braid_context"));
    }

    // -- spans --

    #[test]
    fn records_span_names() {
        let (logs, _guard) = capture_logs();
        let span = tracing::info_span!("add_message");
        let _entered = span.enter();
        tracing::debug!("inside the span");

        assert!(logs.has_span("add_message"));
        assert!(!logs.has_span("build_context"));
    }

    // -- scoping --

    #[test]
    fn guard_scopes_the_capture_to_its_lifetime() {
        let logs = {
            let (logs, _guard) = capture_logs();
            tracing::debug!("while active");
            logs
        };
        tracing::debug!("after the guard dropped");

        assert_eq!(logs.events().len(), 1);
        assert!(logs.has_event(Level::DEBUG, "while active"));
    }
}
