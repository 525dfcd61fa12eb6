//! Per-thread sequence allocation.
//!
//! Every message and tool execution in a thread draws a position from the
//! same counter, giving the thread one total order across both. Sequences
//! are assigned once and never reused — pruning drops messages from the
//! active view but does not return their positions.

/// Monotonic sequence counter for a single thread.
///
/// Lives inside the thread's state and is only touched under the thread's
/// lock, so allocation is a plain increment.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: u64,
}

impl Sequencer {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence. The first call returns 0.
    pub fn next(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }

    /// The sequence the next call to [`Sequencer::next`] will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
